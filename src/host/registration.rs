//! Registration: drives cache managers through their lifecycle
//!
//! The registration plays the part of the page host. It installs new
//! managers, promotes them, keeps the previous manager in control when an
//! install fails, and decides which manager (if any) sees a client's
//! requests.

use crate::config::WorkerConfig;
use crate::error::{PrecacheError, PrecacheResult};
use crate::host::record::RegistrationRecord;
use crate::http::Request;
use crate::network::Network;
use crate::storage::CacheStorage;
use crate::worker::{
    ActivateOutcome, CacheManager, FetchOutcome, InstallOutcome, ResponseSource, WorkerState,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Identifier of a page whose requests may be controlled
pub type ClientId = Uuid;

/// Result of `Registration::register`
#[derive(Debug, Clone)]
pub struct RegisterOutcome {
    pub install: InstallOutcome,
    /// Present when the new manager was activated right away
    pub activation: Option<ActivateOutcome>,
}

/// Installed manager waiting to be promoted
struct Waiting {
    manager: Arc<CacheManager>,
    installed_at: DateTime<Utc>,
}

/// Host-side registration for one scope
pub struct Registration {
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
    active: Option<Arc<CacheManager>>,
    waiting: Option<Waiting>,
    record: Option<RegistrationRecord>,
    /// Client -> controlling manager ID
    clients: HashMap<ClientId, Option<Uuid>>,
}

impl Registration {
    /// Create an empty registration
    pub fn new(storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>) -> Self {
        Self {
            storage,
            network,
            active: None,
            waiting: None,
            record: None,
            clients: HashMap::new(),
        }
    }

    /// Restore the activated manager described by a persisted record.
    ///
    /// The manager keeps the record's cache generation, even if the
    /// configuration has moved on since.
    pub fn resume(
        record: RegistrationRecord,
        storage: Arc<dyn CacheStorage>,
        network: Arc<dyn Network>,
    ) -> Self {
        let mut registration = Self::new(storage.clone(), network.clone());

        if record.state == WorkerState::Activated {
            let config = WorkerConfig {
                cache_name: record.cache_name.clone(),
                scope: record.scope.clone(),
                manifest: record.manifest.clone(),
            };
            let manager = CacheManager::with_state(
                record.worker_id,
                config,
                storage,
                network,
                WorkerState::Activated,
            );
            registration.active = Some(Arc::new(manager));
            registration.record = Some(record);
        } else {
            warn!(
                "Ignoring registration record for {} in state {}",
                record.cache_name, record.state
            );
        }

        registration
    }

    pub fn active(&self) -> Option<&Arc<CacheManager>> {
        self.active.as_ref()
    }

    pub fn waiting(&self) -> Option<&Arc<CacheManager>> {
        self.waiting.as_ref().map(|w| &w.manager)
    }

    /// Record describing the active manager, if any
    pub fn record(&self) -> Option<&RegistrationRecord> {
        self.record.as_ref()
    }

    /// Install a new manager built from `config`.
    ///
    /// On install failure the error is returned and the current active
    /// manager stays in control. On success the manager is activated at
    /// once if it asked to skip waiting or nothing is active yet.
    pub async fn register(&mut self, config: WorkerConfig) -> PrecacheResult<RegisterOutcome> {
        let manager = Arc::new(CacheManager::new(
            config,
            self.storage.clone(),
            self.network.clone(),
        ));
        info!("Registering cache manager {} for {}", manager.id(), manager.cache_name());

        let install = match manager.install().await {
            Ok(install) => install,
            Err(e) => {
                if let Some(active) = &self.active {
                    info!("Keeping {} in control", active.cache_name());
                }
                return Err(e);
            }
        };

        let waiting = Waiting {
            manager,
            installed_at: Utc::now(),
        };
        if let Some(previous) = self.waiting.replace(waiting) {
            previous.manager.mark_redundant().await;
        }

        let activation = if install.skip_waiting || self.active.is_none() {
            Some(self.activate_waiting().await?)
        } else {
            debug!("New manager waiting for {} to release control", install.cache_name);
            None
        };

        Ok(RegisterOutcome {
            install,
            activation,
        })
    }

    /// Promote the waiting manager to active.
    ///
    /// The current active manager keeps control if activation fails.
    pub async fn activate_waiting(&mut self) -> PrecacheResult<ActivateOutcome> {
        let Waiting {
            manager,
            installed_at,
        } = self
            .waiting
            .take()
            .ok_or_else(|| PrecacheError::User("No waiting cache manager".to_string()))?;

        let outcome = manager.activate().await?;

        let previous_id = self.active.as_ref().map(|m| m.id());
        if let Some(previous) = self.active.take() {
            previous.mark_redundant().await;
        }

        // Clients of the replaced manager follow the registration; the rest
        // only when the new manager claims them.
        for controller in self.clients.values_mut() {
            let was_controlled = controller.is_some() && *controller == previous_id;
            if was_controlled || outcome.claim_clients {
                *controller = Some(manager.id());
            }
        }

        self.record = Some(RegistrationRecord {
            worker_id: manager.id(),
            cache_name: manager.cache_name().to_string(),
            scope: manager.config().scope.clone(),
            manifest: manager.config().manifest.clone(),
            state: manager.state().await,
            installed_at,
            activated_at: Some(Utc::now()),
        });
        self.active = Some(manager);

        Ok(outcome)
    }

    /// Open a client. It is controlled by the active manager, if there is one.
    pub fn open_client(&mut self) -> ClientId {
        let id = Uuid::new_v4();
        self.clients.insert(id, self.active.as_ref().map(|m| m.id()));
        id
    }

    pub fn close_client(&mut self, client: ClientId) {
        self.clients.remove(&client);
    }

    /// ID of the manager controlling `client`
    pub fn controller(&self, client: ClientId) -> Option<Uuid> {
        self.clients.get(&client).copied().flatten()
    }

    /// Route a client's request: through its controlling manager, or
    /// straight to the network when uncontrolled.
    pub async fn fetch(&self, client: ClientId, request: &Request) -> PrecacheResult<FetchOutcome> {
        let controller = self
            .clients
            .get(&client)
            .ok_or_else(|| PrecacheError::User(format!("Unknown client: {}", client)))?;

        match (controller, &self.active) {
            (Some(id), Some(active)) if *id == active.id() => active.fetch(request).await,
            _ => {
                debug!("Uncontrolled client, {} goes to network", request.url);
                let response = self.network.fetch(request).await?;
                Ok(FetchOutcome {
                    response,
                    source: ResponseSource::Network,
                })
            }
        }
    }
}
