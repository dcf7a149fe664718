//! Shared state for command execution

use crate::config::{Config, ConfigManager};
use crate::error::PrecacheResult;
use crate::host::{Registration, RegistrationRecord};
use crate::network::HttpNetwork;
use crate::storage::DiskStorage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Loaded configuration plus where state lives
pub struct CommandContext {
    pub config: Config,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
}

impl CommandContext {
    pub fn new(config: Config, config_path: PathBuf, state_dir: Option<PathBuf>) -> Self {
        Self {
            config,
            config_path,
            state_dir: state_dir.unwrap_or_else(ConfigManager::default_state_dir),
        }
    }

    /// Directory holding one file per cache
    pub fn caches_dir(&self) -> PathBuf {
        self.state_dir.join("caches")
    }

    pub async fn storage(&self) -> PrecacheResult<Arc<DiskStorage>> {
        Ok(Arc::new(DiskStorage::new(self.caches_dir()).await?))
    }

    pub fn network(&self) -> Arc<HttpNetwork> {
        Arc::new(HttpNetwork::new(
            Duration::from_secs(self.config.network.timeout_secs),
            &self.config.network.user_agent,
        ))
    }

    pub async fn record(&self) -> PrecacheResult<Option<RegistrationRecord>> {
        RegistrationRecord::load(&self.state_dir).await
    }

    /// Registration restored from the persisted record, or an empty one
    pub async fn registration(&self) -> PrecacheResult<Registration> {
        let storage = self.storage().await?;
        let network = self.network();

        match self.record().await? {
            Some(record) => {
                debug!("Resuming registration for {}", record.cache_name);
                Ok(Registration::resume(record, storage, network))
            }
            None => Ok(Registration::new(storage, network)),
        }
    }
}
