//! Parsing and validation of `scribe.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`] holding cache settings and the opaque analyzer rule table
//! whose digest takes part in cache validity.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::resolve_cache_path;
pub use types::*;
