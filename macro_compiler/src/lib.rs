use std::path::{Path, PathBuf};

use macro_schema::{CompiledMacro, Frame, Milliseconds, SequenceError};
use tracing::trace;

mod encoder;
mod error;
mod include;
mod legacy;
mod tokenizer;
pub mod tokens;

pub use encoder::{classify_token, encode_expression, Token};
pub use error::{CompileError, CompileErrorKind};
pub use include::IncludeChain;
pub use legacy::{load_legacy_file, load_legacy_str};
pub use tokenizer::{parse_duration, split_line, strip_comment};
pub use tokens::{button_names, dpad_name};

pub const MAX_INCLUDE_DEPTH: usize = 10;

#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Directory that relative `@path` includes resolve against when compiling a string.
    pub base_dir: Option<PathBuf>,
    pub max_include_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            base_dir: None,
            max_include_depth: MAX_INCLUDE_DEPTH,
        }
    }
}

pub fn compile_file(path: impl AsRef<Path>) -> Result<CompiledMacro, CompileError> {
    compile_file_with_options(path, CompileOptions::default())
}

pub fn compile_file_with_options(
    path: impl AsRef<Path>,
    options: CompileOptions,
) -> Result<CompiledMacro, CompileError> {
    let path = path.as_ref();
    let frames = include::resolve_file(path, &IncludeChain::default(), 0, &options)
        .map_err(|e| e.in_file(path.display().to_string()))?;
    finish(frames).map_err(|e| e.in_file(path.display().to_string()))
}

pub fn compile_str(src: &str) -> Result<CompiledMacro, CompileError> {
    compile_str_with_options(src, CompileOptions::default())
}

pub fn compile_str_with_options(
    src: &str,
    options: CompileOptions,
) -> Result<CompiledMacro, CompileError> {
    let frames = compile_source(
        src,
        None,
        options.base_dir.as_deref(),
        &IncludeChain::default(),
        0,
        &options,
    )?;
    finish(frames)
}

fn finish(frames: Vec<Frame>) -> Result<CompiledMacro, CompileError> {
    CompiledMacro::new(frames).map_err(|e| match e {
        SequenceError::Empty => CompileError::new("E3001", "macro produced no frames", 0),
        e @ SequenceError::OutOfOrder { .. } => CompileError::new("E1004", e.to_string(), 0),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLine<'a> {
    Skip,
    Include(&'a str),
    Input(&'a str),
}

/// Classifies one physical line, with comments already removed from the payload.
pub fn classify_line(raw: &str) -> SourceLine<'_> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//") {
        return SourceLine::Skip;
    }
    if let Some(target) = trimmed.strip_prefix('@') {
        return SourceLine::Include(include_target(target.trim_start()));
    }
    let body = strip_comment(trimmed).trim();
    if body.is_empty() {
        return SourceLine::Skip;
    }
    SourceLine::Input(body)
}

/// A quoted target is taken up to its closing quote, so `#` and `//` inside
/// it belong to the path.
fn include_target(rest: &str) -> &str {
    if let Some(end) = rest.strip_prefix('"').and_then(|q| q.find('"')) {
        return &rest[..end + 2];
    }
    strip_comment(rest).trim()
}

/// Compiles one input line active at `at`.
///
/// Returns the frame and the running timestamp for the next line.
pub fn compile_line(
    input: &str,
    line_no: usize,
    at: Milliseconds,
) -> Result<(Frame, Milliseconds), CompileError> {
    let (expr, duration) = split_line(input, line_no)?;
    let packet = encode_expression(expr, line_no)?;
    let duration = parse_duration(duration, line_no)?;
    let next = at.checked_add(duration).ok_or_else(|| {
        CompileError::new("E1004", "macro exceeds u32 millisecond range", line_no)
            .with_context(input.to_string())
    })?;
    trace!(line = line_no, at_ms = at, duration_ms = duration, "encoded line");
    Ok((Frame::new(at, packet), next))
}

/// Per-file line loop. `origin` names the file for diagnostics; `base_dir`
/// anchors relative includes.
pub(crate) fn compile_source(
    src: &str,
    origin: Option<&Path>,
    base_dir: Option<&Path>,
    chain: &IncludeChain,
    depth: usize,
    options: &CompileOptions,
) -> Result<Vec<Frame>, CompileError> {
    let attach = |e: CompileError| match origin {
        Some(p) => e.in_file(p.display().to_string()),
        None => e,
    };

    let mut frames = Vec::new();
    let mut now: Milliseconds = 0;

    for (i, raw_line) in src.lines().enumerate() {
        let line_no = i + 1;
        match classify_line(raw_line) {
            SourceLine::Skip => continue,
            SourceLine::Include(target) => {
                let path = include::resolve_target(target, base_dir, line_no).map_err(attach)?;
                let included = include::resolve_file(&path, chain, depth + 1, options)
                    .map_err(|e| attach(e.at_line(line_no)))?;
                now = include::splice(&mut frames, included, now, line_no).map_err(attach)?;
            }
            SourceLine::Input(input) => {
                let (frame, next) = compile_line(input, line_no, now).map_err(attach)?;
                frames.push(frame);
                now = next;
            }
        }
    }

    if !frames.is_empty() {
        frames.push(Frame::neutral(now));
    }
    Ok(frames)
}
