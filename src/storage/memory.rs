//! In-process cache storage

use crate::error::PrecacheResult;
use crate::http::{RequestKey, Response};
use crate::storage::CacheStorage;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct NamedCache {
    name: String,
    entries: BTreeMap<RequestKey, Response>,
}

/// Cache storage held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    // Vec keeps creation order for keys()
    caches: RwLock<Vec<NamedCache>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryStorage {
    async fn open(&self, cache: &str) -> PrecacheResult<()> {
        let mut caches = self.caches.write().await;
        if !caches.iter().any(|c| c.name == cache) {
            caches.push(NamedCache {
                name: cache.to_string(),
                entries: BTreeMap::new(),
            });
        }
        Ok(())
    }

    async fn has(&self, cache: &str) -> PrecacheResult<bool> {
        Ok(self.caches.read().await.iter().any(|c| c.name == cache))
    }

    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        Ok(self
            .caches
            .read()
            .await
            .iter()
            .map(|c| c.name.clone())
            .collect())
    }

    async fn delete(&self, cache: &str) -> PrecacheResult<bool> {
        let mut caches = self.caches.write().await;
        let before = caches.len();
        caches.retain(|c| c.name != cache);
        Ok(caches.len() != before)
    }

    async fn get(&self, cache: &str, key: &RequestKey) -> PrecacheResult<Option<Response>> {
        Ok(self
            .caches
            .read()
            .await
            .iter()
            .find(|c| c.name == cache)
            .and_then(|c| c.entries.get(key).cloned()))
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> PrecacheResult<()> {
        let mut caches = self.caches.write().await;
        let idx = match caches.iter().position(|c| c.name == cache) {
            Some(idx) => idx,
            None => {
                caches.push(NamedCache {
                    name: cache.to_string(),
                    entries: BTreeMap::new(),
                });
                caches.len() - 1
            }
        };
        caches[idx].entries.extend(entries);
        Ok(())
    }

    async fn entries(&self, cache: &str) -> PrecacheResult<Vec<RequestKey>> {
        Ok(self
            .caches
            .read()
            .await
            .iter()
            .find(|c| c.name == cache)
            .map(|c| c.entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
