//! Cache manager: one versioned cache, three lifecycle handlers
//!
//! Install stores every manifest resource, activate removes every cache of
//! another generation, and fetch serves from the cache before going to the
//! network. Network responses are never written back on a miss.

use crate::config::WorkerConfig;
use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{self, Request, RequestKey, Response};
use crate::network::Network;
use crate::storage::CacheStorage;
use crate::worker::event::{
    ActivateOutcome, EventOutcome, FetchOutcome, InstallOutcome, LifecycleEvent, ResponseSource,
};
use crate::worker::state::WorkerState;
use futures_util::future::join_all;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns one named cache and mediates fetches through it
pub struct CacheManager {
    id: Uuid,
    config: WorkerConfig,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
}

impl CacheManager {
    /// Create a manager in the `New` state
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        Self::with_state(Uuid::new_v4(), config, storage, network, WorkerState::New)
    }

    /// Rebuild a manager whose lifecycle already progressed in an earlier run
    pub fn with_state(
        id: Uuid,
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
        state: WorkerState,
    ) -> Self {
        Self {
            id,
            config,
            storage,
            network,
            state: RwLock::new(state),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    async fn transition(&self, next: WorkerState) -> PrecacheResult<()> {
        let mut state = self.state.write().await;
        if !state.can_transition(next) {
            return Err(PrecacheError::InvalidTransition {
                from: *state,
                to: next,
            });
        }
        debug!("Cache manager {}: {} -> {}", self.config.cache_name, *state, next);
        *state = next;
        Ok(())
    }

    /// Retire this manager in favour of a newer one. Terminal managers are left as is.
    pub async fn mark_redundant(&self) {
        let mut state = self.state.write().await;
        if state.can_transition(WorkerState::Redundant) {
            *state = WorkerState::Redundant;
        }
    }

    /// Manifest entries resolved against the scope, as GET requests
    pub fn manifest_requests(&self) -> PrecacheResult<Vec<Request>> {
        self.config
            .manifest
            .iter()
            .map(|entry| http::resolve_url(&self.config.scope, entry).map(Request::get))
            .collect()
    }

    /// Route a lifecycle event to its handler
    pub async fn dispatch(&self, event: LifecycleEvent) -> PrecacheResult<EventOutcome> {
        debug!("Dispatching {} event", event.name());
        match event {
            LifecycleEvent::Install => self.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Fetch(request) => {
                self.fetch(&request).await.map(EventOutcome::Fetched)
            }
        }
    }

    /// Populate the cache with every manifest resource.
    ///
    /// All resources are fetched before anything is written; a single
    /// failure leaves the cache untouched and the manager `Failed`.
    pub async fn install(&self) -> PrecacheResult<InstallOutcome> {
        self.transition(WorkerState::Installing).await?;
        info!("Installing cache manager for {}", self.config.cache_name);

        match self.populate().await {
            Ok(entries) => {
                self.transition(WorkerState::Installed).await?;
                info!(
                    "Installed {} ({} entries)",
                    self.config.cache_name, entries
                );
                Ok(InstallOutcome {
                    cache_name: self.config.cache_name.clone(),
                    entries,
                    skip_waiting: true,
                })
            }
            Err(e) => {
                self.transition(WorkerState::Failed).await?;
                warn!("Install of {} failed: {}", self.config.cache_name, e);
                Err(e)
            }
        }
    }

    async fn populate(&self) -> PrecacheResult<usize> {
        let cache = &self.config.cache_name;
        let install_error = |reason: String| PrecacheError::InstallFailed {
            cache: cache.clone(),
            reason,
        };

        let requests = self
            .manifest_requests()
            .map_err(|e| install_error(e.to_string()))?;

        self.storage
            .open(cache)
            .await
            .map_err(|e| install_error(e.to_string()))?;
        info!("Opened cache {}, storing {} resources", cache, requests.len());

        let mut batch: Vec<(RequestKey, Response)> = Vec::with_capacity(requests.len());
        for request in &requests {
            let response = self
                .network
                .fetch(request)
                .await
                .map_err(|e| install_error(e.to_string()))?;

            if !response.ok() {
                return Err(install_error(format!(
                    "{}: unexpected status {}",
                    request.url, response.status
                )));
            }

            debug!("Fetched {} ({} bytes)", request.url, response.body.len());
            batch.push((request.key(), response));
        }

        self.storage
            .put_all(cache, batch)
            .await
            .map_err(|e| install_error(e.to_string()))?;

        let entries = self
            .storage
            .entries(cache)
            .await
            .map_err(|e| install_error(e.to_string()))?;
        Ok(entries.len())
    }

    /// Delete every cache whose name differs from this manager's cache.
    ///
    /// Deletions run concurrently. A deletion that fails is logged and
    /// reported in the outcome but does not stop activation.
    pub async fn activate(&self) -> PrecacheResult<ActivateOutcome> {
        self.transition(WorkerState::Activating).await?;
        info!("Activating cache manager for {}", self.config.cache_name);

        let keys = match self.storage.keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!("Could not list caches, skipping cleanup: {}", e);
                vec![]
            }
        };

        let stale: Vec<String> = keys
            .into_iter()
            .filter(|key| key != &self.config.cache_name)
            .collect();

        let results = join_all(stale.into_iter().map(|key| async move {
            info!("Deleting stale cache {}", key);
            let result = self.storage.delete(&key).await;
            (key, result)
        }))
        .await;

        let mut outcome = ActivateOutcome {
            claim_clients: true,
            ..Default::default()
        };
        for (key, result) in results {
            match result {
                Ok(true) => outcome.deleted.push(key),
                Ok(false) => debug!("Stale cache {} was already gone", key),
                Err(e) => {
                    warn!("Failed to delete stale cache {}: {}", key, e);
                    outcome.failed.push(key);
                }
            }
        }

        self.transition(WorkerState::Activated).await?;
        info!("Activated {}", self.config.cache_name);
        Ok(outcome)
    }

    /// Cache-first fetch interception.
    ///
    /// Only GET requests are looked up. On a miss the network response is
    /// returned unchanged, whatever its status.
    pub async fn fetch(&self, request: &Request) -> PrecacheResult<FetchOutcome> {
        let state = self.state().await;
        if !state.intercepts_fetches() {
            return Err(PrecacheError::NotActivated(state));
        }

        debug!("Fetching {} {}", request.method, request.url);

        if request.is_get() {
            match self.storage.get(&self.config.cache_name, &request.key()).await {
                Ok(Some(response)) => {
                    info!("Serving {} from cache", request.url);
                    return Ok(FetchOutcome {
                        response,
                        source: ResponseSource::Cache,
                    });
                }
                Ok(None) => {}
                Err(e) => warn!("Cache lookup for {} failed: {}", request.url, e),
            }
        }

        info!("Serving {} from network", request.url);
        let response = self.network.fetch(request).await?;
        Ok(FetchOutcome {
            response,
            source: ResponseSource::Network,
        })
    }
}
