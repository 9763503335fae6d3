//! Configuration management for eduerp.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::persist::DEFAULT_BACKUP_PREFIX;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "eduerp";

/// Default data file name.
const DATA_FILE_NAME: &str = "erp_data.json";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `EDUERP_`, sections split by `__`)
/// 2. TOML config file at `~/.config/eduerp/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Interactive menu configuration.
    pub menu: MenuConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the data file.
    /// Defaults to `~/.local/share/eduerp/erp_data.json`
    pub data_file: Option<PathBuf>,
    /// Directory that receives backups.
    /// Defaults to the data file's directory.
    pub backup_dir: Option<PathBuf>,
    /// File name prefix for backups.
    pub backup_prefix: String,
    /// Write indented, human-readable JSON.
    pub pretty: bool,
    /// Save the data file when the interactive menu exits.
    pub save_on_exit: bool,
}

/// Interactive menu configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuConfig {
    /// Ask for `y/n` confirmation before removing records.
    pub confirm_removals: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_file: None, // Will be resolved to default at runtime
            backup_dir: None,
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
            pretty: true,
            save_on_exit: true,
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            confirm_removals: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("EDUERP_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Point the configuration at another data file and re-validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting configuration is invalid.
    pub fn with_data_file(mut self, path: PathBuf) -> Result<Self> {
        self.storage.data_file = Some(path);
        self.validate()?;
        Ok(self)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let prefix = &self.storage.backup_prefix;
        if prefix.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "backup_prefix cannot be empty".to_string(),
            });
        }
        if prefix.contains(['/', '\\']) {
            return Err(Error::ConfigValidation {
                message: format!("backup_prefix must not contain path separators: {prefix}"),
            });
        }

        if let Some(path) = &self.storage.data_file {
            if path.file_name().is_none() {
                return Err(Error::ConfigValidation {
                    message: format!("data_file must name a file: {}", path.display()),
                });
            }
        }

        Ok(())
    }

    /// Get the data file path, resolving defaults if not set.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.storage
            .data_file
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATA_FILE_NAME))
    }

    /// Get the backup directory, resolving defaults if not set.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.storage.backup_dir.clone().unwrap_or_else(|| {
            self.data_file()
                .parent()
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.pretty);
        assert!(config.storage.save_on_exit);
        assert!(config.menu.confirm_removals);
        assert_eq!(config.storage.backup_prefix, "erp_backup");
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.data_file.is_none());
        assert!(storage.backup_dir.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_prefix() {
        let mut config = Config::default();
        config.storage.backup_prefix = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("backup_prefix"));
    }

    #[test]
    fn test_validate_prefix_with_separator() {
        let mut config = Config::default();
        config.storage.backup_prefix = "../escape".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("path separators"));
    }

    #[test]
    fn test_validate_data_file_without_name() {
        let mut config = Config::default();
        config.storage.data_file = Some(PathBuf::from("/"));

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("data_file"));
    }

    #[test]
    fn test_data_file_default() {
        let config = Config::default();
        let path = config.data_file();

        assert!(path.to_string_lossy().contains("eduerp"));
        assert!(path.to_string_lossy().ends_with("erp_data.json"));
    }

    #[test]
    fn test_data_file_custom() {
        let mut config = Config::default();
        config.storage.data_file = Some(PathBuf::from("/srv/school/records.json"));

        assert_eq!(config.data_file(), PathBuf::from("/srv/school/records.json"));
        assert_eq!(config.backup_dir(), PathBuf::from("/srv/school"));
    }

    #[test]
    fn test_with_data_file_override() {
        let config = Config::default()
            .with_data_file(PathBuf::from("/srv/school/records.json"))
            .unwrap();
        assert_eq!(config.data_file(), PathBuf::from("/srv/school/records.json"));

        let result = Config::default().with_data_file(PathBuf::from("/"));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_backup_dir_custom() {
        let mut config = Config::default();
        config.storage.backup_dir = Some(PathBuf::from("/backups"));

        assert_eq!(config.backup_dir(), PathBuf::from("/backups"));
    }

    #[test]
    fn test_backup_dir_for_bare_file_name() {
        let mut config = Config::default();
        config.storage.data_file = Some(PathBuf::from("erp_data.json"));

        assert_eq!(config.backup_dir(), PathBuf::from(""));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("eduerp"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Jail serializes access to the process environment.
        figment::Jail::expect_with(|_jail| {
            let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
            assert!(result.is_ok());
            assert_eq!(result.unwrap(), Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "eduerp.toml",
                r#"
                [storage]
                data_file = "school.json"
                backup_prefix = "nightly"
                pretty = false

                [menu]
                confirm_removals = false
                "#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("eduerp.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.data_file(), PathBuf::from("school.json"));
            assert_eq!(config.storage.backup_prefix, "nightly");
            assert!(!config.storage.pretty);
            assert!(config.storage.save_on_exit);
            assert!(!config.menu.confirm_removals);
            Ok(())
        });
    }

    #[test]
    fn test_load_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("EDUERP_STORAGE__BACKUP_PREFIX", "envsnap");
            jail.set_env("EDUERP_STORAGE__SAVE_ON_EXIT", "false");

            let config = Config::load_from(Some(PathBuf::from("missing.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.storage.backup_prefix, "envsnap");
            assert!(!config.storage.save_on_exit);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[storage]\nbackup_prefix = \"a/b\"\n")?;
            let result = Config::load_from(Some(PathBuf::from("bad.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"backup_prefix": "snap", "pretty": false}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.backup_prefix, "snap");
        assert!(!storage.pretty);
        assert!(storage.save_on_exit);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("backup_prefix"));
        assert!(json.contains("confirm_removals"));
    }
}
