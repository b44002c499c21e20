//! Error type for inputs rejected before they reach the cache.

/// An input that cannot be turned into a cache key.
///
/// Raised immediately rather than hashing or storing a value that would
/// never match again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInputError {
    /// The document identifier was empty after normalization.
    #[error("document identifier is empty")]
    EmptyDocumentId,

    /// The document identifier resolves outside the corpus root.
    #[error("document identifier '{0}' escapes the corpus root")]
    EscapesRoot(String),

    /// A path could not be expressed relative to the corpus root.
    #[error("path '{path}' is not inside corpus root '{root}'")]
    OutsideRoot {
        /// The offending path.
        path: String,
        /// The corpus root it was compared against.
        root: String,
    },

    /// The configuration value has no generic structural representation.
    #[error("configuration cannot be hashed: {0}")]
    Config(String),
}

impl serde::ser::Error for InvalidInputError {
    fn custom<T: std::fmt::Display>(msg: T) -> Self {
        Self::Config(msg.to_string())
    }
}
