//! Error types for cache operations.

use std::path::PathBuf;

use scribe_common::InvalidInputError;

/// Errors that can occur during cache operations.
///
/// Most cache reads are fail-safe: a missing, corrupt or stale record
/// results in an empty store rather than an error. This enum covers the
/// conditions a caller has to act on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A document to be hashed does not exist.
    #[error("document not found: {path}")]
    NotFound {
        /// The missing document path.
        path: PathBuf,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },

    /// An identifier or configuration value was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

impl CacheError {
    /// Wraps an I/O error, mapping `NotFound` to [`CacheError::NotFound`].
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}
