use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use macro_compiler::CompileError;
use macro_emit::{EmitOptions, Platform};
use macro_schema::CompiledMacro;
use tracing::info;

mod inspect;

#[derive(Debug, Parser)]
#[command(name = "macroc")]
#[command(about = "Controller macro compiler CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    CHeader,
    Json,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compile a macro into an embeddable frame table
    Compile {
        input: PathBuf,
        /// Output path, or `-` for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Restart playback after the last frame
        #[arg(long = "loop")]
        looped: bool,
        #[arg(long, value_enum, default_value_t = Format::CHeader)]
        format: Format,
        #[arg(long, value_enum, default_value_t = Platform::Avr)]
        platform: Platform,
        /// Treat the input as a recorded JSON frame list (implied by a .json extension)
        #[arg(long)]
        legacy: bool,
    },
    /// Print the compiled frame timeline
    Inspect {
        input: PathBuf,
        #[arg(long = "loop")]
        looped: bool,
        /// Also show the frame the player outputs at this time (ms)
        #[arg(long)]
        at: Option<u32>,
        #[arg(long)]
        legacy: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compile {
            input,
            output,
            looped,
            format,
            platform,
            legacy,
        } => {
            let frames = load_macro(&input, legacy)?;
            info!(
                frames = frames.len(),
                duration_ms = frames.total_duration_ms(),
                "compiled {}",
                input.display()
            );

            let rendered = match format {
                Format::CHeader => {
                    macro_emit::emit_c_header(&frames, &EmitOptions { looped, platform })
                }
                Format::Json => macro_emit::emit_json(&frames).context("failed to serialize frames")?,
            };

            let out_path = output.unwrap_or_else(|| default_output_path(&input, format));
            if out_path.as_os_str() == "-" {
                print!("{rendered}");
            } else {
                fs::write(&out_path, rendered)
                    .with_context(|| format!("failed to write: {}", out_path.display()))?;
            }
        }
        Command::Inspect {
            input,
            looped,
            at,
            legacy,
        } => {
            let frames = load_macro(&input, legacy)?;
            inspect::print_timeline(&frames, looped, at);
        }
    }

    Ok(())
}

fn load_macro(input: &Path, legacy: bool) -> anyhow::Result<CompiledMacro> {
    let is_json = input.extension().is_some_and(|ext| ext == "json");
    let result = if legacy || is_json {
        macro_compiler::load_legacy_file(input)
    } else {
        macro_compiler::compile_file(input)
    };
    result
        .map_err(|e| anyhow::anyhow!(describe(&e)))
        .with_context(|| format!("compile failed: {}", input.display()))
}

fn describe(err: &CompileError) -> String {
    match &err.file {
        Some(file) => format!("{file}: {err}"),
        None => err.to_string(),
    }
}

fn default_output_path(input: &Path, format: Format) -> PathBuf {
    let mut out = input.to_path_buf();
    match format {
        Format::CHeader => out.set_extension("h"),
        Format::Json => out.set_extension("frames.json"),
    };
    out
}
