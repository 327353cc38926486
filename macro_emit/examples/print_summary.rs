use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
struct Args {
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let frames = macro_emit::load_frames_json_from_path(args.path)?;
    println!("frames={}", frames.len());
    println!("total_duration_ms={}", frames.total_duration_ms());
    println!("ends_neutral={}", frames.last().packet.is_neutral());
    Ok(())
}
