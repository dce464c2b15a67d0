//! Unified error types for the toyc workspace.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ToycError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A descriptor file could not be decoded.
    #[error("malformed descriptor {path}: {source}")]
    Malformed {
        /// Descriptor path.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },

    /// A configuration value is invalid or missing.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A mount entry cannot be turned into a mount specification.
    #[error("mount entry {index}: {message}")]
    InvalidMount {
        /// Position of the entry in the descriptor's mount list.
        index: usize,
        /// What is wrong with the entry.
        message: String,
    },

    /// A subprocess could not be located or started.
    #[error("starting {program}: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying cause.
        message: String,
    },

    /// A best-effort cleanup step failed.
    #[error("{step} {path}: {message}")]
    Teardown {
        /// Cleanup step, e.g. the teardown program name or `rmdir`.
        step: String,
        /// Runtime path being cleaned up.
        path: PathBuf,
        /// Underlying cause.
        message: String,
    },
}

impl ToycError {
    /// Returns `true` for the not-found condition, so callers can tell a
    /// missing container apart from other load failures.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ToycError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = ToycError::NotFound {
            kind: "container",
            id: "c1".into(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "container not found: c1");
    }

    #[test]
    fn io_error_is_not_not_found() {
        let err = ToycError::Io {
            path: "/tmp/x".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn teardown_error_formats_step_and_path() {
        let err = ToycError::Teardown {
            step: "rmdir".into(),
            path: "/run/c1".into(),
            message: "busy".into(),
        };
        assert_eq!(err.to_string(), "rmdir /run/c1: busy");
    }
}
