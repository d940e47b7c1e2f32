//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is a valid config.
//!
//! ```toml
//! [registry]
//! merge_policy = "first-wins"
//! memoize_inheritance = true
//! max_inheritance_depth = 64
//!
//! [validation]
//! reserved_interface = "IMixinTarget"
//! treat_warnings_as_failures = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// What to do when two ancestors contribute different configurations for one mixin
///
/// Identical contributions are always deduplicated silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Fail with `MixinError::ConflictingMixins`
    #[default]
    Error,
    /// Keep the contribution of the earliest ancestor
    FirstWins,
    /// Keep the contribution of the latest ancestor
    LastWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub merge_policy: MergePolicy,
    /// Cache configurations synthesized through inheritance
    pub memoize_inheritance: bool,
    pub max_inheritance_depth: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            merge_policy: MergePolicy::Error,
            memoize_inheritance: true,
            max_inheritance_depth: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Full name of the infrastructure interface no mixin may introduce
    pub reserved_interface: String,
    pub treat_warnings_as_failures: bool,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            reserved_interface: "IMixinTarget".to_string(),
            treat_warnings_as_failures: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub registry: RegistryConfig,
    pub validation: ValidationSettings,
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loading engine config from {:?}", path);
        Self::from_toml_str(&content)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.registry.max_inheritance_depth == 0 {
            return Err(ConfigError::Invalid(
                "registry.max_inheritance_depth must be at least 1".to_string(),
            ));
        }
        if self.validation.reserved_interface.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "validation.reserved_interface must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.registry.merge_policy, MergePolicy::Error);
        assert!(config.registry.memoize_inheritance);
    }

    #[test]
    fn test_partial_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [registry]
            merge_policy = "last-wins"

            [validation]
            treat_warnings_as_failures = true
            "#,
        )
        .unwrap();

        assert_eq!(config.registry.merge_policy, MergePolicy::LastWins);
        assert_eq!(config.registry.max_inheritance_depth, 64);
        assert!(config.validation.treat_warnings_as_failures);
        assert_eq!(config.validation.reserved_interface, "IMixinTarget");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[registry]\nmax_inheritance_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[registry]\nmerge_policy = \"random\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[registry]\nmerge_policy = \"first-wins\"").unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.registry.merge_policy, MergePolicy::FirstWins);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            EngineConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
