//! Error types for shell environment resolution.

use thiserror::Error;

/// Main error type for the shellenv library.
#[derive(Debug, Error)]
pub enum ShellEnvError {
    // Validation errors
    #[error("{param} must be {expected}, not {actual}")]
    Validation {
        param: String,
        expected: String,
        actual: String,
    },

    // Account / shell discovery errors
    #[error("Resolution error: {message}")]
    Resolution { message: String },

    #[error("Shell {shell} exited with {status}: {stderr}")]
    ShellFailed {
        shell: String,
        /// Exit status description (code or signal)
        status: String,
        /// Diagnostic output of the shell, verbatim
        stderr: String,
    },

    // File system / process errors
    #[error("IO error while {operation}: {message}")]
    Io {
        operation: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

/// Result type alias for shellenv operations.
pub type Result<T> = std::result::Result<T, ShellEnvError>;

impl From<std::io::Error> for ShellEnvError {
    fn from(err: std::io::Error) -> Self {
        ShellEnvError::Io {
            operation: "running the shell".to_string(),
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ShellEnvError {
    /// Create an IO error naming the operation that failed.
    pub fn io(operation: impl Into<String>, err: std::io::Error) -> Self {
        ShellEnvError::Io {
            operation: operation.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a resolution error.
    pub fn resolution(message: impl Into<String>) -> Self {
        ShellEnvError::Resolution {
            message: message.into(),
        }
    }

    /// Check if this error was raised by argument validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, ShellEnvError::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = ShellEnvError::Validation {
            param: "shell_path".into(),
            expected: "a non-empty string".into(),
            actual: "empty string".into(),
        };
        assert_eq!(
            err.to_string(),
            "shell_path must be a non-empty string, not empty string"
        );
        assert!(err.is_validation());
    }

    #[test]
    fn test_shell_failed_carries_stderr() {
        let err = ShellEnvError::ShellFailed {
            shell: "/bin/zsh".into(),
            status: "exit code 1".into(),
            stderr: "zsh: bad option".into(),
        };
        assert!(err.to_string().contains("zsh: bad option"));
        assert!(!err.is_validation());
    }
}
