//! Centralized error handling for the editor core
//! Defines error kinds, severity levels, and the status-line error buffer

use std::fmt;

/// Severity level of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational message (not really an error)
    Info,
    /// Warning - something might be wrong but operation can continue
    Warning,
    /// Standard error - operation failed but editor can continue
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Category of the error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input from the embedding: bad syntax file, bad branch number
    InvalidInput,
    /// File system errors surfaced through the thin loaders
    Io,
    /// The requested thing does not exist (nothing to undo, no such state)
    NotFound,
    /// Internal logic or invariant violations
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "InvalidInput"),
            Self::Io => write!(f, "IO"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Internal => write!(f, "Internal"),
        }
    }
}

/// A structured core error
///
/// The core never prints; callers format this into the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreError {
    /// How serious the error is
    pub severity: ErrorSeverity,
    /// What kind of error occurred
    pub kind: ErrorKind,
    /// Human-readable description
    pub message: String,
}

impl CoreError {
    /// Create a new standard error (Severity: Error)
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Error,
            kind,
            message: message.into(),
        }
    }

    /// Create a new informational message
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Info,
            kind: ErrorKind::NotFound,
            message: message.into(),
        }
    }

    /// Error for a malformed line in a config-style file, with position
    pub fn in_file(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            severity: ErrorSeverity::Error,
            kind: ErrorKind::InvalidInput,
            message: format!("{}:{}: {}", file, line, message.into()),
        }
    }

    /// Check if the message contains a substring (useful for tests)
    pub fn contains_msg(&self, sub: &str) -> bool {
        self.message.contains(sub)
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.kind, self.message)
    }
}

impl std::error::Error for CoreError {}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::new(ErrorKind::Io, e.to_string())
    }
}

/// Convenience alias used throughout the core
pub type Result<T> = std::result::Result<T, CoreError>;

/// One-line message buffer for the embedding's status line.
///
/// The command layer catches typed failures and stores the rendered text
/// here; the display reads it on the next repaint.
#[derive(Debug, Clone, Default)]
pub struct ErrorBuffer {
    msg: String,
    msg_is_error: bool,
}

impl ErrorBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an informational message
    pub fn info(&mut self, msg: impl Into<String>) {
        self.msg = msg.into();
        self.msg_is_error = false;
    }

    /// Store an error message
    pub fn error(&mut self, msg: impl Into<String>) {
        self.msg = msg.into();
        self.msg_is_error = true;
    }

    /// Store a typed failure, keeping its severity
    pub fn report(&mut self, err: &CoreError) {
        self.msg = err.message.clone();
        self.msg_is_error = err.severity >= ErrorSeverity::Error;
    }

    pub fn clear(&mut self) {
        self.msg.clear();
        self.msg_is_error = false;
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.msg
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.msg_is_error
    }
}
