//! Cache manager lifecycle
//!
//! A cache manager reacts to three signals from its host:
//!
//! | Event | Handler | Effect |
//! |-------|---------|--------|
//! | install | `CacheManager::install` | store every manifest resource |
//! | activate | `CacheManager::activate` | delete caches of other generations |
//! | fetch | `CacheManager::fetch` | serve from cache, else network |

pub mod event;
pub mod manager;
pub mod state;

pub use event::{
    ActivateOutcome, EventOutcome, FetchOutcome, InstallOutcome, LifecycleEvent, ResponseSource,
};
pub use manager::CacheManager;
pub use state::WorkerState;
