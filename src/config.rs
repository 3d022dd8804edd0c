use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Environment variable that overrides `database_path`.
pub const DATABASE_ENV_VAR: &str = "NOTE_DB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database_path: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub show_note_ids: bool,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: String::new(),
            log_level: default_log_level(),
            show_note_ids: false,
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from the profile's config directory, creating the
    /// file with defaults if it is missing.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from(&config_path, profile)
    }

    /// Load configuration from an explicit file, creating it with defaults if missing.
    /// An empty `database_path` is filled in from the profile's data directory.
    pub fn load_from(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        let mut config = if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            toml::from_str(&contents)?
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.save_to(config_path)?;
            log::info!("wrote default config to {}", config_path.display());
            config
        };

        if config.database_path.trim().is_empty() {
            config.database_path = Self::default_database_path_for_profile(profile);
        }

        Ok(config)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile)
            .ok_or_else(|| ConfigError::ConfigDirError("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("notes.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.note-dev/notes.db".to_string(),
                utils::Profile::Prod => "~/.note/notes.db".to_string(),
            }
        }
    }

    /// The expanded database path, honouring the `NOTE_DB` override.
    pub fn get_database_path(&self) -> PathBuf {
        match std::env::var(DATABASE_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => utils::expand_path(&path),
            _ => utils::expand_path(&self.database_path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Profile;

    #[test]
    fn missing_file_is_written_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");

        let config = Config::load_from(&path, Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.log_level, "warn");
        assert!(!config.show_note_ids);
        assert!(config.database_path.ends_with("notes.db"));

        let reloaded = Config::load_from(&path, Profile::Dev).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "show_note_ids = true\n").unwrap();

        let config = Config::load_from(&path, Profile::Prod).unwrap();
        assert!(config.show_note_ids);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));
        assert!(!config.database_path.is_empty());
    }

    #[test]
    fn explicit_database_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "database_path = \"/srv/notes/custom.db\"\nlog_level = \"debug\"\n").unwrap();

        let config = Config::load_from(&path, Profile::Prod).unwrap();
        assert_eq!(config.database_path, "/srv/notes/custom.db");
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "log_level = [").unwrap();
        assert!(matches!(Config::load_from(&path, Profile::Prod), Err(ConfigError::ParseError(_))));
    }
}
