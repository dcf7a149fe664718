//! Lifecycle events delivered by the host and what each handler reports back

use crate::http::{Request, Response};
use serde::Serialize;
use std::fmt;

/// Signal delivered to a cache manager by its host
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// First-time or updated registration
    Install,
    /// Promotion to active control
    Activate,
    /// Resource request from a controlled client
    Fetch(Request),
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::Activate => "activate",
            LifecycleEvent::Fetch(_) => "fetch",
        }
    }
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallOutcome {
    pub cache_name: String,
    /// Entries held by the cache after population
    pub entries: usize,
    /// Ask the host to skip the waiting hold-off
    pub skip_waiting: bool,
}

/// Result of activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateOutcome {
    /// Stale caches removed
    pub deleted: Vec<String>,
    /// Stale caches whose deletion failed
    pub failed: Vec<String>,
    /// Ask the host to take control of already-open clients
    pub claim_clients: bool,
}

/// Where a fetched response came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseSource {
    Cache,
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Cache => write!(f, "cache"),
            ResponseSource::Network => write!(f, "network"),
        }
    }
}

/// Result of fetch interception
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub response: Response,
    pub source: ResponseSource,
}

/// Outcome of `CacheManager::dispatch`
#[derive(Debug, Clone)]
pub enum EventOutcome {
    Installed(InstallOutcome),
    Activated(ActivateOutcome),
    Fetched(FetchOutcome),
}
