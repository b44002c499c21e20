//! Configuration types deserialized from `scribe.toml`.

use scribe_common::{hash_config, ContentHash};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".scribe-cache";

/// Default name of the cache record inside the cache directory.
pub const DEFAULT_CACHE_FILE: &str = "documents.json";

/// The top-level project configuration parsed from `scribe.toml`.
///
/// Only the `[cache]` section is interpreted here. The `[rules]` table belongs
/// to the analyzer and is carried verbatim so it can be hashed as part of
/// the cache identity.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectConfig {
    /// Incremental cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
    /// Analyzer rule configuration, opaque to the cache.
    #[serde(default)]
    pub rules: toml::Table,
}

impl ProjectConfig {
    /// Returns the order-independent digest of the `[rules]` table.
    pub fn rules_hash(&self) -> Result<ContentHash, ConfigError> {
        Ok(hash_config(&self.rules)?)
    }
}

/// Settings controlling where and whether analysis results are cached.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CacheSettings {
    /// Whether cached results may be reused at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Cache directory, relative to the project root unless absolute.
    #[serde(default = "default_directory")]
    pub directory: String,
    /// File name of the cache record inside `directory`.
    #[serde(default = "default_file")]
    pub file: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            directory: default_directory(),
            file: default_file(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

fn default_file() -> String {
    DEFAULT_CACHE_FILE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_settings_defaults() {
        let settings = CacheSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.directory, ".scribe-cache");
        assert_eq!(settings.file, "documents.json");
    }

    #[test]
    fn rules_hash_ignores_key_order() {
        let a: ProjectConfig = toml::from_str(
            r#"
[rules]
max-line-length = 100
heading-style = "atx"
"#,
        )
        .unwrap();
        let b: ProjectConfig = toml::from_str(
            r#"
[rules]
heading-style = "atx"
max-line-length = 100
"#,
        )
        .unwrap();
        assert_eq!(a.rules_hash().unwrap(), b.rules_hash().unwrap());
    }

    #[test]
    fn rules_hash_rejects_nan_and_inf() {
        for rule in ["x = nan", "x = inf", "x = -inf"] {
            let config: ProjectConfig = toml::from_str(&format!("[rules]\n{rule}\n")).unwrap();
            let err = config.rules_hash().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRules(_)), "{rule} hashed");
        }
    }

    #[test]
    fn rules_hash_tracks_values() {
        let a: ProjectConfig = toml::from_str("[rules]\nmax-line-length = 100\n").unwrap();
        let b: ProjectConfig = toml::from_str("[rules]\nmax-line-length = 120\n").unwrap();
        assert_ne!(a.rules_hash().unwrap(), b.rules_hash().unwrap());
    }
}
