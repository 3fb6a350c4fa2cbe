//! Global configuration for shallowize (stored in ~/.config/shallowize/config.toml)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::compact::Strategy;
use crate::error::{Result, ShallowizeError};

const CONFIG_DIR: &str = "shallowize";
const CONFIG_FILE: &str = "config.toml";
pub const CONFIG_DIR_ENV_VAR: &str = "SHALLOWIZE_CONFIG_DIR";

/// Settings read from the global config file.
///
/// Every field is optional; command-line flags take precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub strategy: Option<Strategy>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub prune_now: Option<bool>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl GlobalConfig {
    fn config_path() -> Result<PathBuf> {
        // Allow environment variable override for testing
        let config_dir = if let Ok(env_dir) = std::env::var(CONFIG_DIR_ENV_VAR) {
            PathBuf::from(env_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| {
                    ShallowizeError::Configuration(
                        "unable to determine config directory".to_string(),
                    )
                })?
                .join(CONFIG_DIR)
        };

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// Load the global config, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = match Self::config_path() {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(error = %e, "no config directory, using defaults");
                return Ok(Self::default());
            }
        };
        Self::load_from(&path)
    }

    /// Load a config file from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            ShallowizeError::Configuration(format!(
                "failed to read config from {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            ShallowizeError::Configuration(format!(
                "failed to parse config from {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let config = GlobalConfig::load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_load_all_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "root = \"/srv/src\"\nlimit = 3\nstrategy = \"fetch\"\nremote = \"upstream\"\nprune_now = true\ntimeout_secs = 60\n",
        )
        .unwrap();

        let config = GlobalConfig::load_from(&path).unwrap();
        assert_eq!(config.root, Some(PathBuf::from("/srv/src")));
        assert_eq!(config.limit, Some(3));
        assert_eq!(config.strategy, Some(Strategy::Fetch));
        assert_eq!(config.remote.as_deref(), Some("upstream"));
        assert_eq!(config.prune_now, Some(true));
        assert_eq!(config.timeout_secs, Some(60));
    }

    #[test]
    fn test_unknown_key_is_configuration_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "depth = 5\n").unwrap();

        let err = GlobalConfig::load_from(&path).unwrap_err();
        assert!(err.is_fatal());
    }
}
