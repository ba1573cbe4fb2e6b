//! Error types for newterm.
//!
//! Validation problems are reported before any OS work happens. Everything the
//! operating system rejects is a `Platform` error carrying the OS diagnostic
//! text verbatim.

use thiserror::Error;

/// Main error type for the newterm library.
#[derive(Debug, Error)]
pub enum NewtermError {
    // Validation errors
    #[error("{param} must be {expected}, not {actual}")]
    Validation {
        param: String,
        expected: String,
        actual: String,
    },

    // OS errors
    #[error("{operation} failed: {message}")]
    Platform { operation: String, message: String },

    #[error("{capability} is not available on {platform}")]
    Unsupported {
        capability: String,
        platform: String,
    },

    // Mapping / policy gaps
    #[error("Resolution error: {message}")]
    Resolution { message: String },

    #[error("IO error while {operation}: {message}")]
    Io {
        operation: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error(transparent)]
    ShellEnv(#[from] shellenv::ShellEnvError),
}

/// Result type alias for newterm operations.
pub type Result<T> = std::result::Result<T, NewtermError>;

impl From<std::io::Error> for NewtermError {
    fn from(err: std::io::Error) -> Self {
        NewtermError::Io {
            operation: "launching".to_string(),
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl NewtermError {
    /// Create a validation error.
    pub fn validation(
        param: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        NewtermError::Validation {
            param: param.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a platform error for a failed OS operation.
    pub fn platform(operation: impl Into<String>, message: impl Into<String>) -> Self {
        NewtermError::Platform {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a platform error from an IO error.
    pub fn io(operation: impl Into<String>, err: std::io::Error) -> Self {
        NewtermError::Io {
            operation: operation.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Check if this error was raised by argument validation.
    pub fn is_validation(&self) -> bool {
        match self {
            NewtermError::Validation { .. } => true,
            NewtermError::ShellEnv(inner) => inner.is_validation(),
            _ => false,
        }
    }

    /// Name of the offending parameter, for validation errors.
    pub fn param(&self) -> Option<&str> {
        match self {
            NewtermError::Validation { param, .. } => Some(param),
            _ => None,
        }
    }
}
