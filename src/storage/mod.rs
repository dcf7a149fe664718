//! Named cache storage
//!
//! The cache manager never touches persistence directly. It talks to a
//! `CacheStorage`, which holds any number of named caches, each a map from
//! request identity to a stored response.
//!
//! | Backend | Persistence | Use |
//! |---------|-------------|-----|
//! | `MemoryStorage` | process lifetime | tests, embedding |
//! | `DiskStorage` | one JSON file per cache | CLI |

pub mod disk;
pub mod memory;

pub use disk::DiskStorage;
pub use memory::MemoryStorage;

use crate::error::PrecacheResult;
use crate::http::{RequestKey, Response};
use async_trait::async_trait;

/// Abstract cache storage interface
///
/// Writes go through `put_all`, which must either store every entry or
/// none of them.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a cache, creating it empty if it does not exist
    async fn open(&self, cache: &str) -> PrecacheResult<()>;

    /// Check whether a cache exists
    async fn has(&self, cache: &str) -> PrecacheResult<bool>;

    /// List cache names in creation order
    async fn keys(&self) -> PrecacheResult<Vec<String>>;

    /// Delete a cache and all its entries. Returns false if it did not exist.
    async fn delete(&self, cache: &str) -> PrecacheResult<bool>;

    /// Look up a stored response. A missing cache is a miss.
    async fn get(&self, cache: &str, key: &RequestKey) -> PrecacheResult<Option<Response>>;

    /// Store a batch of entries atomically, creating the cache if needed.
    /// Existing entries with the same identity are replaced.
    async fn put_all(&self, cache: &str, entries: Vec<(RequestKey, Response)>)
        -> PrecacheResult<()>;

    /// List the identities stored in a cache
    async fn entries(&self, cache: &str) -> PrecacheResult<Vec<RequestKey>>;

    /// Human-readable backend name for display
    fn backend_name(&self) -> &'static str;
}
