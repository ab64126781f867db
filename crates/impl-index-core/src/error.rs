//! Error types for the implementor index.
//!
//! The handoff itself cannot fail. Errors come from building records with a
//! broken shape and from reading or writing generated artifacts.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the implementor index.
#[derive(Debug, Error)]
pub enum IndexError {
    // Shape errors
    #[error("Structural violation in {field}: {message}")]
    StructuralViolation { field: String, message: String },

    // Artifact errors
    #[error("Artifact parse error at line {line}: {message}")]
    ArtifactParse { line: usize, message: String },

    #[error("Unsupported artifact format: {0}")]
    UnsupportedFormat(PathBuf),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

/// Result type alias for implementor index operations.
pub type Result<T> = std::result::Result<T, IndexError>;

impl IndexError {
    /// Shorthand for a [`IndexError::StructuralViolation`].
    pub fn structural(field: impl Into<String>, message: impl Into<String>) -> Self {
        IndexError::StructuralViolation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether this error was caused by a payload with a broken shape.
    pub fn is_structural(&self) -> bool {
        matches!(self, IndexError::StructuralViolation { .. })
    }
}

impl From<std::io::Error> for IndexError {
    fn from(err: std::io::Error) -> Self {
        IndexError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
