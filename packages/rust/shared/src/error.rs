//! Error types for Refinery.
//!
//! Library crates use [`RefineryError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! A lookup that matches nothing is not an error: resolver operations return
//! `Ok(None)` and leave the translation to a 404 (or similar) to the caller.

use std::path::PathBuf;

/// Top-level error type for all Refinery operations.
#[derive(Debug, thiserror::Error)]
pub enum RefineryError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (unknown condition key, duplicate slug, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A record addressed by a write operation does not exist.
    #[error("not found: {0}")]
    NotFound(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, RefineryError>;

impl RefineryError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = RefineryError::config("frontend_locales must not be empty");
        assert_eq!(
            err.to_string(),
            "config error: frontend_locales must not be empty"
        );

        let err = RefineryError::validation("unknown condition key 'colour'");
        assert!(err.to_string().contains("colour"));

        let err = RefineryError::NotFound("page 7".into());
        assert_eq!(err.to_string(), "not found: page 7");
    }
}
