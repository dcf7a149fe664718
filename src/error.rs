//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

use crate::worker::WorkerState;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Lifecycle errors
    #[error("Install failed for cache {cache}: {reason}")]
    InstallFailed { cache: String, reason: String },

    #[error("Invalid lifecycle transition: {from} -> {to}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    #[error("Cache manager is not activated (state: {0})")]
    NotActivated(WorkerState),

    // Network errors
    #[error("Network error: {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Invalid URL: {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    // Storage errors
    #[error("Cache storage error: {0}")]
    Storage(String),

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InstallFailed { .. } => {
                Some("Check that every manifest entry is reachable from the configured scope")
            }
            Self::ConfigInvalid { .. } => Some("Run: precache config init --force"),
            Self::CacheNotFound(_) => Some("Run: precache cache list"),
            _ => None,
        }
    }
}
