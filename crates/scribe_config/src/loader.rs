//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "scribe.toml";

/// Loads and validates a `scribe.toml` configuration from a project directory.
///
/// A project without a configuration file gets the defaults.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = match std::fs::read_to_string(&config_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ProjectConfig::default()),
        Err(e) => return Err(e.into()),
    };
    load_config_from_str(&content)
}

/// Parses and validates a `scribe.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and non-empty and that the
/// rule table can be hashed.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.cache.directory.trim().is_empty() {
        return Err(ConfigError::MissingField("cache.directory".to_string()));
    }
    if config.cache.file.trim().is_empty() {
        return Err(ConfigError::MissingField("cache.file".to_string()));
    }
    config.rules_hash()?;
    Ok(())
}
