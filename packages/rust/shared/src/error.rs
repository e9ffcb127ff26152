//! Error types for Boardroom.
//!
//! Library crates use [`BoardroomError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Boardroom operations.
#[derive(Debug, thiserror::Error)]
pub enum BoardroomError {
    /// Configuration loading or validation error (config file, instruction files, API key).
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure of the external text-generation call.
    #[error("agent error: {message}")]
    Agent { message: String, retryable: bool },

    /// Response or payload decoding error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invariant violation (e.g. an artifact written twice in one run).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BoardroomError>;

impl BoardroomError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Agent failure worth another attempt (rate limit, 5xx, transport).
    pub fn agent_transient(msg: impl Into<String>) -> Self {
        Self::Agent {
            message: msg.into(),
            retryable: true,
        }
    }

    /// Agent failure that will not go away on retry (auth, bad request).
    pub fn agent_fatal(msg: impl Into<String>) -> Self {
        Self::Agent {
            message: msg.into(),
            retryable: false,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying the failed operation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Agent { retryable: true, .. })
    }
}
