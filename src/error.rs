//! Error taxonomy for directive parsing.
//!
//! # Design Decisions
//! - Every error is fatal to the current parse; the first one aborts
//! - `ConfError` pairs an `ErrorKind` with the file/line it was raised at
//! - Setters report `SetError`, the parser attaches directive name and position

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Position of a statement or token in a configuration source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// File name (or a synthetic name for in-memory sources).
    pub file: Arc<str>,
    /// 1-based line number.
    pub line: usize,
}

impl Location {
    pub fn new(file: impl Into<Arc<str>>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// What went wrong while registering modules or parsing a configuration.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed token, quoting or block structure.
    #[error("{0}")]
    Syntax(String),

    /// No command in the current context matches the directive name.
    #[error("unknown directive \"{name}\"")]
    UnknownDirective { name: String },

    /// More than one module declares the directive for this context.
    #[error("ambiguous directive \"{name}\" declared by modules {modules:?}")]
    AmbiguousDirective { name: String, modules: Vec<String> },

    /// Argument count does not satisfy the command's shape.
    #[error("invalid number of arguments in \"{name}\" directive: expected {expected}, got {actual}")]
    ArgumentCountMismatch {
        name: String,
        expected: String,
        actual: usize,
    },

    /// A non-block directive was followed by `{`.
    #[error("directive \"{name}\" does not take a block")]
    UnexpectedBlock { name: String },

    /// A block directive was terminated by `;`.
    #[error("directive \"{name}\" has no opening \"{{\"")]
    MissingBlock { name: String },

    /// `}` with no open block to close.
    #[error("unexpected \"}}\"")]
    UnbalancedBlock,

    /// A directive flagged as unique appeared twice in one context.
    #[error("\"{name}\" directive is duplicate")]
    DuplicateDirective { name: String },

    /// The setter could not parse an argument.
    #[error("invalid value \"{token}\" in \"{name}\" directive: {reason}")]
    InvalidDirectiveValue {
        name: String,
        token: String,
        reason: String,
    },

    /// The post-validator rejected the stored value.
    #[error("value out of range in \"{name}\" directive: {reason}")]
    ValueOutOfRange { name: String, reason: String },

    /// A module with the same identity was registered twice.
    #[error("module \"{name}\" is already registered")]
    DuplicateModule { name: String },

    /// A command table entry is malformed.
    #[error("invalid command \"{name}\" in module \"{module}\": {reason}")]
    InvalidCommand {
        module: String,
        name: String,
        reason: String,
    },

    /// A module lifecycle hook failed.
    #[error("module \"{module}\" hook failed: {reason}")]
    HookFailed { module: String, reason: String },

    /// Includes nested deeper than the configured limit.
    #[error("include nesting exceeds {limit} levels")]
    IncludeDepth { limit: usize },

    /// Blocks nested deeper than the configured limit.
    #[error("block nesting exceeds {limit} levels")]
    BlockDepth { limit: usize },

    /// The file reader has no such path.
    #[error("file \"{path}\" not found")]
    NotFound { path: String },

    /// The file reader failed.
    #[error("failed to read \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Input ended inside a block, a quote or a statement.
    #[error("unexpected end of file")]
    UnexpectedEof,
}

/// A parse or registry failure, with the position it was raised at.
#[derive(Debug)]
pub struct ConfError {
    kind: ErrorKind,
    location: Option<Location>,
}

impl ConfError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            location: None,
        }
    }

    pub fn at(kind: ErrorKind, location: Location) -> Self {
        Self {
            kind,
            location: Some(location),
        }
    }

    pub fn syntax(message: impl Into<String>, location: Location) -> Self {
        Self::at(ErrorKind::Syntax(message.into()), location)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// Attach a location if none is recorded yet.
    pub(crate) fn or_at(mut self, location: &Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location.clone());
        }
        self
    }
}

impl fmt::Display for ConfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{} in {}", self.kind, loc),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for ConfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.kind)
    }
}

impl From<ErrorKind> for ConfError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Result type for registry and parser operations.
pub type ConfResult<T> = Result<T, ConfError>;

/// Failure reported by a slot setter, block strategy or post-validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    /// An argument could not be converted.
    #[error("invalid value \"{token}\": {reason}")]
    Invalid { token: String, reason: String },

    /// The stored value failed range checks.
    #[error("{0}")]
    OutOfRange(String),

    /// The record handed to the setter is not the type the command targets.
    #[error("configuration record type mismatch")]
    RecordMismatch,
}

impl SetError {
    pub fn invalid(token: impl Into<String>, reason: impl Into<String>) -> Self {
        SetError::Invalid {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Convert into a parse error for directive `name` at `location`.
    pub(crate) fn into_conf(self, name: &str, location: Location) -> ConfError {
        let kind = match self {
            SetError::Invalid { token, reason } => ErrorKind::InvalidDirectiveValue {
                name: name.to_string(),
                token,
                reason,
            },
            SetError::OutOfRange(reason) => ErrorKind::ValueOutOfRange {
                name: name.to_string(),
                reason,
            },
            SetError::RecordMismatch => ErrorKind::InvalidDirectiveValue {
                name: name.to_string(),
                token: name.to_string(),
                reason: "directive has no configuration record in this context".to_string(),
            },
        };
        ConfError::at(kind, location)
    }
}
