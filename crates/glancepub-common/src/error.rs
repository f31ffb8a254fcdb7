//! Unified error types for the glancepub workspace.
//!
//! Library crates return [`GlancepubError`] directly; the CLI wraps it in
//! `anyhow` for reporting.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum GlancepubError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is missing or invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A content unit lacks a required key or carries a malformed value.
    #[error("invalid unit: {message}")]
    InvalidUnit {
        /// Description of the problem.
        message: String,
    },

    /// A destination is already occupied by something else.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Type of the conflicting resource.
        kind: &'static str,
        /// Identifier (usually a path) of the conflicting resource.
        id: String,
    },

    /// A checksum validation failed.
    #[error("checksum mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Resource that failed validation.
        resource: String,
        /// Expected checksum.
        expected: String,
        /// Actual computed checksum.
        actual: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl GlancepubError {
    /// Builds a closure mapping an [`std::io::Error`] to [`GlancepubError::Io`]
    /// for the given path, for use with `map_err`.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GlancepubError>;
