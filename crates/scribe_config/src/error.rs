//! Error types for configuration loading and validation.

use scribe_common::InvalidInputError;

/// Errors that can occur when loading or validating a `scribe.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The rule table could not be hashed.
    #[error("invalid rule configuration: {0}")]
    InvalidRules(#[from] InvalidInputError),
}
