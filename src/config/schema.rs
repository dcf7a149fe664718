//! Configuration schema for precache
//!
//! Configuration is stored at `~/.config/precache/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache manager settings
    pub worker: WorkerConfig,

    /// Network settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Cache manager settings
///
/// `cache_name` is the cache generation. Changing it is the only way to
/// invalidate what previous versions stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Versioned cache identifier
    pub cache_name: String,

    /// Base URL the manager controls; relative manifest entries resolve against it
    pub scope: String,

    /// Resources stored at install time, fetched in this order
    pub manifest: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: "app-cache-v1".to_string(),
            scope: "http://localhost:8080/".to_string(),
            manifest: vec![
                "/".to_string(),
                "index.html".to_string(),
                "manifest.json".to_string(),
            ],
        }
    }
}

/// Network settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Global per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("precache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
