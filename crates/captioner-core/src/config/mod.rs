//! Configuration management.
//!
//! Configuration is loaded from `config.toml` in the platform config
//! directory, with defaults for every field.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Vision API settings
    pub api: ApiConfig,

    /// Batch dispatch settings
    pub batch: BatchConfig,

    /// Retry settings
    pub retry: RetryConfig,

    /// File locations
    pub paths: PathsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Platform config directory for this tool.
    ///
    /// - macOS: ~/Library/Application Support/rs.captioner.captioner
    /// - Linux: ~/.config/captioner
    /// - Windows: C:\Users\<User>\AppData\Roaming\captioner\config
    ///
    /// Falls back to ~/.captioner if directory detection fails.
    pub fn config_dir() -> PathBuf {
        directories::ProjectDirs::from("rs", "captioner", "captioner")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".captioner")
            })
    }

    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Resolved API settings file path (with ~ expansion).
    pub fn settings_path(&self) -> PathBuf {
        resolve_or(&self.paths.settings_file, "api_settings.json")
    }

    /// Resolved saved-prompts CSV path (with ~ expansion).
    pub fn prompts_path(&self) -> PathBuf {
        resolve_or(&self.paths.prompts_file, "saved_prompts.csv")
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn resolve_or(configured: &Option<String>, file_name: &str) -> PathBuf {
    match configured {
        Some(path) => PathBuf::from(shellexpand::tilde(path).into_owned()),
        None => Config::config_dir().join(file_name),
    }
}
