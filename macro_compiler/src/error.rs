use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    MalformedLine,
    UnknownToken,
    StickOutOfRange,
    InvalidDuration,
    Io,
    IncludeNotFound,
    CircularInclude,
    IncludeDepthExceeded,
    EmptyMacro,
    InvalidLegacyFormat,
}

impl CompileErrorKind {
    pub(crate) fn from_code(code: &'static str) -> Self {
        match code {
            // Line syntax
            "E1001" => Self::MalformedLine,
            "E1002" => Self::UnknownToken,
            "E1003" => Self::StickOutOfRange,
            "E1004" => Self::InvalidDuration,

            // Files and includes
            "E2001" => Self::Io,
            "E2002" => Self::IncludeNotFound,
            "E2003" => Self::CircularInclude,
            "E2004" => Self::IncludeDepthExceeded,

            // Structure
            "E3001" => Self::EmptyMacro,

            // Legacy input
            "E4001" => Self::InvalidLegacyFormat,

            _ => Self::MalformedLine,
        }
    }
}

#[derive(Debug, Error, Clone)]
#[error("{code}: {message} (line {line})")]
pub struct CompileError {
    pub code: &'static str,
    pub kind: CompileErrorKind,
    pub message: String,
    /// 1-based; 0 when the error is not tied to a line.
    pub line: usize,

    pub file: Option<String>,
    pub context: Option<String>,
}

impl CompileError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            kind: CompileErrorKind::from_code(code),
            message: message.into(),
            line,

            file: None,
            context: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Attaches `file` unless an inner include already did.
    pub(crate) fn in_file(self, file: impl Into<String>) -> Self {
        if self.file.is_some() {
            self
        } else {
            self.with_file(file)
        }
    }

    pub(crate) fn at_line(mut self, line: usize) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        self
    }
}
