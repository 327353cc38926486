use std::{
    fs,
    path::{Path, PathBuf},
};

use macro_schema::{Frame, Milliseconds};
use tracing::debug;

use crate::{compile_source, CompileError, CompileOptions};

/// Files currently being expanded on the active resolution path.
///
/// Extending the chain yields a new value, so sibling includes never see each
/// other as ancestors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncludeChain {
    paths: Vec<PathBuf>,
}

impl IncludeChain {
    pub fn with(&self, path: impl Into<PathBuf>) -> Self {
        let mut paths = self.paths.clone();
        paths.push(path.into());
        Self { paths }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// `a -> b -> next`, for diagnostics.
    pub fn describe(&self, next: &Path) -> String {
        self.paths
            .iter()
            .map(|p| p.display().to_string())
            .chain(std::iter::once(next.display().to_string()))
            .collect::<Vec<_>>()
            .join(" -> ")
    }
}

/// Resolves the target of an `@path` directive against the including file's directory.
pub(crate) fn resolve_target(
    target: &str,
    base_dir: Option<&Path>,
    line_no: usize,
) -> Result<PathBuf, CompileError> {
    let target = target.trim();
    let target = target
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(target);
    if target.is_empty() {
        return Err(CompileError::new("E1001", "missing include path after @", line_no));
    }

    let raw = Path::new(target);
    let full = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        let Some(dir) = base_dir else {
            return Err(CompileError::new(
                "E2002",
                format!(
                    "relative include {target} requires compile_file() or CompileOptions.base_dir"
                ),
                line_no,
            )
            .with_context(target.to_string()));
        };
        dir.join(raw)
    };

    if !full.is_file() {
        return Err(
            CompileError::new(
                "E2002",
                format!("include not found: {}", full.display()),
                line_no,
            )
            .with_context(target.to_string()),
        );
    }
    Ok(full)
}

/// Compiles one file at `depth`, returning its frames including the terminal
/// neutral frame (or nothing if the file has no input lines).
pub(crate) fn resolve_file(
    path: &Path,
    chain: &IncludeChain,
    depth: usize,
    options: &CompileOptions,
) -> Result<Vec<Frame>, CompileError> {
    if depth > options.max_include_depth {
        return Err(CompileError::new(
            "E2004",
            format!(
                "include depth {depth} exceeds limit of {} at {}",
                options.max_include_depth,
                path.display()
            ),
            0,
        ));
    }

    let canonical = fs::canonicalize(path).map_err(|e| {
        CompileError::new("E2001", format!("failed to read {}: {e}", path.display()), 0)
    })?;
    if chain.contains(&canonical) {
        return Err(CompileError::new(
            "E2003",
            format!("circular include: {}", chain.describe(&canonical)),
            0,
        )
        .with_context(chain.describe(&canonical)));
    }
    let chain = chain.with(canonical.clone());

    let src = fs::read_to_string(&canonical).map_err(|e| {
        CompileError::new("E2001", format!("failed to read {}: {e}", path.display()), 0)
    })?;

    debug!(path = %canonical.display(), depth, "compiling macro file");
    // Relative includes follow the path as written, not a symlink's target.
    compile_source(
        &src,
        Some(canonical.as_path()),
        path.parent(),
        &chain,
        depth,
        options,
    )
}

/// Appends an included file's frames at `now`, dropping its terminal frame.
///
/// Returns the running timestamp after the include.
pub(crate) fn splice(
    out: &mut Vec<Frame>,
    mut included: Vec<Frame>,
    now: Milliseconds,
    line_no: usize,
) -> Result<Milliseconds, CompileError> {
    let Some(terminal) = included.pop() else {
        return Ok(now);
    };

    let overflow = || CompileError::new("E1004", "macro exceeds u32 millisecond range", line_no);
    for frame in included {
        let at = now.checked_add(frame.timestamp_ms).ok_or_else(overflow)?;
        out.push(Frame::new(at, frame.packet));
    }
    let next = now.checked_add(terminal.timestamp_ms).ok_or_else(overflow)?;

    debug!(at_ms = now, duration_ms = terminal.timestamp_ms, "spliced include");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompileErrorKind;
    use macro_schema::Packet;

    #[test]
    fn chain_extension_does_not_touch_the_parent() {
        let root = IncludeChain::default().with("/m/main.macro");
        let left = root.with("/m/a.macro");
        let right = root.with("/m/b.macro");

        assert_eq!(root.len(), 1);
        assert!(left.contains(Path::new("/m/a.macro")));
        assert!(!right.contains(Path::new("/m/a.macro")));
        assert_eq!(
            left.describe(Path::new("/m/main.macro")),
            "/m/main.macro -> /m/a.macro -> /m/main.macro"
        );
    }

    #[test]
    fn splice_retimes_and_drops_terminal() {
        let a = Packet::from_parts(1 << 2, 8, (128, 128), (128, 128));
        let b = Packet::from_parts(1 << 1, 8, (128, 128), (128, 128));
        let included = vec![Frame::new(0, a), Frame::new(100, b), Frame::neutral(150)];

        let mut out = vec![Frame::new(0, Packet::NEUTRAL)];
        let next = splice(&mut out, included, 40, 1).unwrap();

        assert_eq!(next, 190);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], Frame::new(40, a));
        assert_eq!(out[2], Frame::new(140, b));
    }

    #[test]
    fn splice_of_empty_include_contributes_nothing() {
        let mut out = Vec::new();
        assert_eq!(splice(&mut out, vec![], 70, 1).unwrap(), 70);
        assert!(out.is_empty());
    }

    #[test]
    fn splice_of_terminal_only_include_contributes_nothing() {
        let mut out = Vec::new();
        assert_eq!(splice(&mut out, vec![Frame::neutral(0)], 70, 1).unwrap(), 70);
        assert!(out.is_empty());
    }

    #[test]
    fn splice_overflow_is_invalid_duration() {
        let mut out = Vec::new();
        let err = splice(&mut out, vec![Frame::neutral(10)], u32::MAX - 5, 3).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::InvalidDuration);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn relative_target_without_base_dir_is_not_found() {
        let err = resolve_target("sub.macro", None, 2).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::IncludeNotFound);
        assert_eq!(err.line, 2);
    }

    #[test]
    fn empty_target_is_malformed() {
        let err = resolve_target("  ", None, 5).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::MalformedLine);
    }
}
