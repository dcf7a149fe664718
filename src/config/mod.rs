//! Configuration management for precache

pub mod schema;

pub use schema::{Config, GeneralConfig, NetworkConfig, WorkerConfig};

use crate::error::{PrecacheError, PrecacheResult};
use crate::http;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("precache")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn default_state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("precache")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> PrecacheResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> PrecacheResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| PrecacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config).map_err(|reason| PrecacheError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> PrecacheResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            PrecacheError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> PrecacheResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PrecacheError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check values serde cannot check on its own
pub fn validate(config: &Config) -> Result<(), String> {
    if config.worker.cache_name.trim().is_empty() {
        return Err("worker.cache_name must not be empty".to_string());
    }
    http::validate_absolute(&config.worker.scope)
        .map_err(|e| format!("worker.scope: {}", e))?;
    if let Some(entry) = config.worker.manifest.iter().find(|e| e.trim().is_empty()) {
        return Err(format!("worker.manifest contains an empty entry: {:?}", entry));
    }
    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err(format!(
            "general.log_format must be \"text\" or \"json\", got \"{}\"",
            config.general.log_format
        ));
    }
    if config.network.timeout_secs == 0 {
        return Err("network.timeout_secs must be greater than 0".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.worker.cache_name, "app-cache-v1");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.worker.cache_name = "app-cache-v7".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.worker.cache_name, "app-cache-v7");
    }

    #[tokio::test]
    async fn invalid_scope_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[worker]\nscope = \"app/\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, PrecacheError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("worker.scope"));
    }

    #[test]
    fn validate_rules() {
        assert!(validate(&Config::default()).is_ok());

        let mut config = Config::default();
        config.worker.cache_name = " ".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.general.log_format = "yaml".to_string();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.network.timeout_secs = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.worker.manifest.push(String::new());
        assert!(validate(&config).is_err());
    }
}
