//! Registration record persistence
//!
//! The active registration is written to `<state>/registration.json` so that
//! separate invocations share the same activated cache manager.

use crate::error::{PrecacheError, PrecacheResult};
use crate::worker::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

const RECORD_FILE: &str = "registration.json";

/// Persisted view of the active cache manager
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Manager instance ID
    pub worker_id: Uuid,

    /// Cache generation owned by the manager
    pub cache_name: String,

    /// Scope the manager controls
    pub scope: String,

    /// Manifest the cache was populated from
    pub manifest: Vec<String>,

    /// Lifecycle state when recorded
    pub state: WorkerState,

    /// When install completed
    pub installed_at: DateTime<Utc>,

    /// When activation completed
    pub activated_at: Option<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// Get record file path
    pub fn file_path(state_dir: &Path) -> PathBuf {
        state_dir.join(RECORD_FILE)
    }

    /// Load record from the state directory
    pub async fn load(state_dir: &Path) -> PrecacheResult<Option<Self>> {
        let path = Self::file_path(state_dir);

        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await.map_err(|e| {
            PrecacheError::io(format!("reading registration file {}", path.display()), e)
        })?;

        let record: RegistrationRecord = serde_json::from_str(&content)?;
        Ok(Some(record))
    }

    /// Save record to the state directory
    pub async fn save(&self, state_dir: &Path) -> PrecacheResult<()> {
        let path = Self::file_path(state_dir);

        fs::create_dir_all(state_dir)
            .await
            .map_err(|e| PrecacheError::io("creating state directory", e))?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).await.map_err(|e| {
            PrecacheError::io(format!("writing registration file {}", path.display()), e)
        })?;

        Ok(())
    }

    /// Delete the record file if present
    pub async fn delete(state_dir: &Path) -> PrecacheResult<bool> {
        let path = Self::file_path(state_dir);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).await.map_err(|e| {
            PrecacheError::io(format!("deleting registration file {}", path.display()), e)
        })?;
        Ok(true)
    }
}
