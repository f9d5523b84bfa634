//! Application Configuration
//!
//! Manages editor and logging settings stored as TOML:
//! - Action log retention and rope rebalancing
//! - Log filter and formatting

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use directories::ProjectDirs;
use tracing::{info, debug};

use crate::error::{PedError, Result};

/// Editor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of actions kept in the undo log
    pub max_action_log: usize,
    /// Rebalance a line's rope once its height exceeds this (0 never rebalances)
    pub rebuild_height: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_action_log: 1000,
            rebuild_height: 64,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
    /// Include source file names in log lines
    pub with_file: bool,
    /// Include line numbers in log lines
    pub with_line_number: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            with_file: true,
            with_line_number: true,
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PedConfig {
    /// Configuration version for migrations
    pub version: u32,
    /// Editor settings
    pub editor: EditorConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

impl Default for PedConfig {
    fn default() -> Self {
        Self {
            version: 1,
            editor: EditorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PedConfig {
    /// Get the configuration directory path
    pub fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("dev", "ped", "ped")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the configuration file path
    pub fn config_file() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub async fn load() -> Result<Self> {
        let config_file = Self::config_file()
            .ok_or_else(|| PedError::Config("Cannot determine config path".into()))?;
        Self::load_from(&config_file).await
    }

    /// Load configuration from `path`, writing defaults there if it does not exist
    pub async fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {:?}", path);
            let contents = tokio::fs::read_to_string(path).await?;
            let config: PedConfig = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            info!("Config file not found, using defaults");
            let config = PedConfig::default();
            config.save_to(path).await?;
            Ok(config)
        }
    }

    /// Save configuration to the default location
    pub async fn save(&self) -> Result<()> {
        let config_file = Self::config_file()
            .ok_or_else(|| PedError::Config("Cannot determine config path".into()))?;
        self.save_to(&config_file).await
    }

    /// Save configuration to `path`
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = toml::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    /// Reject settings the editor cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.editor.max_action_log == 0 {
            return Err(PedError::Config("editor.max_action_log must be at least 1".into()));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(PedError::Config("logging.filter must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PedConfig::default();
        assert_eq!(config.version, 1);
        assert_eq!(config.editor.max_action_log, 1000);
        assert_eq!(config.logging.filter, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: PedConfig = toml::from_str("[editor]\nmax_action_log = 5\n").unwrap();
        assert_eq!(config.editor.max_action_log, 5);
        assert_eq!(config.editor.rebuild_height, 64);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_validate_rejects_empty_action_log() {
        let mut config = PedConfig::default();
        config.editor.max_action_log = 0;
        assert!(matches!(config.validate(), Err(PedError::Config(_))));
    }

    #[tokio::test]
    async fn test_load_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = PedConfig::load_from(&path).await.unwrap();
        assert_eq!(config, PedConfig::default());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = PedConfig::default();
        config.editor.max_action_log = 42;
        config.logging.filter = "ped_editor=trace".into();
        config.save_to(&path).await.unwrap();

        let loaded = PedConfig::load_from(&path).await.unwrap();
        assert_eq!(loaded, config);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "editor = [").await.unwrap();

        assert!(matches!(PedConfig::load_from(&path).await, Err(PedError::TomlParse(_))));
    }
}
