//! On-disk cache storage
//!
//! Each cache lives in `<dir>/<hash>.json`, where `<hash>` is the first 16
//! hex characters of the SHA-256 of the cache name. Files are replaced
//! through a temporary file and a rename, so a reader sees either the old
//! or the new contents of a cache, never a partial batch.

use crate::error::{PrecacheError, PrecacheResult};
use crate::http::{RequestKey, Response};
use crate::storage::CacheStorage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Serialized form of one cache
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheFile {
    name: String,
    created_at: DateTime<Utc>,
    /// Keyed by the `"METHOD URL"` form of the identity
    entries: BTreeMap<String, StoredEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: RequestKey,
    response: Response,
    stored_at: DateTime<Utc>,
}

impl CacheFile {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }
}

/// Cache storage persisted as JSON files in a directory
pub struct DiskStorage {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl DiskStorage {
    /// Create a storage rooted at `dir`, creating the directory if needed
    pub async fn new(dir: PathBuf) -> PrecacheResult<Self> {
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| PrecacheError::io(format!("creating cache directory {}", dir.display()), e))?;
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    fn cache_path(&self, cache: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(cache.as_bytes());
        let hash = hex::encode(&hasher.finalize()[..8]);
        self.dir.join(format!("{}.json", hash))
    }

    async fn read_file(path: &Path) -> PrecacheResult<Option<CacheFile>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading cache file {}", path.display()), e))?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|e| {
            PrecacheError::Storage(format!("corrupt cache file {}: {}", path.display(), e))
        })?;
        Ok(Some(file))
    }

    async fn load(&self, cache: &str) -> PrecacheResult<Option<CacheFile>> {
        let path = self.cache_path(cache);
        match Self::read_file(&path).await? {
            Some(file) if file.name == cache => Ok(Some(file)),
            Some(file) => Err(PrecacheError::Storage(format!(
                "cache file {} belongs to '{}', expected '{}'",
                path.display(),
                file.name,
                cache
            ))),
            None => Ok(None),
        }
    }

    async fn write(&self, file: &CacheFile) -> PrecacheResult<()> {
        let path = self.cache_path(&file.name);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(file)?;

        fs::write(&tmp, content)
            .await
            .map_err(|e| PrecacheError::io(format!("writing cache file {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| PrecacheError::io(format!("replacing cache file {}", path.display()), e))?;

        debug!("Wrote cache {} ({} entries)", file.name, file.entries.len());
        Ok(())
    }
}

#[async_trait]
impl CacheStorage for DiskStorage {
    async fn open(&self, cache: &str) -> PrecacheResult<()> {
        let _guard = self.write_lock.lock().await;
        if self.load(cache).await?.is_none() {
            self.write(&CacheFile::new(cache)).await?;
        }
        Ok(())
    }

    async fn has(&self, cache: &str) -> PrecacheResult<bool> {
        Ok(self.load(cache).await?.is_some())
    }

    async fn keys(&self) -> PrecacheResult<Vec<String>> {
        let mut caches = vec![];
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| PrecacheError::io("reading cache directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PrecacheError::io("reading cache directory entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                match Self::read_file(&path).await {
                    Ok(Some(file)) => caches.push((file.created_at, file.name)),
                    Ok(None) => {}
                    Err(e) => warn!("Skipping unreadable cache file {}: {}", path.display(), e),
                }
            }
        }

        caches.sort();
        Ok(caches.into_iter().map(|(_, name)| name).collect())
    }

    async fn delete(&self, cache: &str) -> PrecacheResult<bool> {
        let _guard = self.write_lock.lock().await;
        let path = self.cache_path(cache);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .await
            .map_err(|e| PrecacheError::io(format!("deleting cache file {}", path.display()), e))?;
        Ok(true)
    }

    async fn get(&self, cache: &str, key: &RequestKey) -> PrecacheResult<Option<Response>> {
        Ok(self
            .load(cache)
            .await?
            .and_then(|mut file| file.entries.remove(&key.to_string()))
            .map(|entry| entry.response))
    }

    async fn put_all(
        &self,
        cache: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> PrecacheResult<()> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.load(cache).await?.unwrap_or_else(|| CacheFile::new(cache));
        let now = Utc::now();
        for (key, response) in entries {
            file.entries.insert(
                key.to_string(),
                StoredEntry {
                    key,
                    response,
                    stored_at: now,
                },
            );
        }
        self.write(&file).await
    }

    async fn entries(&self, cache: &str) -> PrecacheResult<Vec<RequestKey>> {
        Ok(self
            .load(cache)
            .await?
            .map(|file| file.entries.into_values().map(|e| e.key).collect())
            .unwrap_or_default())
    }

    fn backend_name(&self) -> &'static str {
        "disk"
    }
}
