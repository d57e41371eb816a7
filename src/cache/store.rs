//! Cache storage.
//!
//! `CacheStore` is the key/value contract the book list cache is written
//! against; `MemoryCacheStore` is the in-process implementation shared by all
//! requests of a running server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;
use time::OffsetDateTime;

use super::clock::{Clock, SystemClock};
use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheStoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Key/value storage with per-entry time-to-live.
///
/// Values are opaque bytes. Implementations are shared across requests and
/// need not be durable.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the live value for `key`, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheStoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheStoreError>;
}

struct StoredEntry {
    value: Bytes,
    expires_at: OffsetDateTime,
}

/// In-process LRU store with lazy expiry.
///
/// An entry is live while `now < expires_at`; expired entries are dropped the
/// next time they are read.
pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, StoredEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.capacity_non_zero())),
            clock,
        }
    }

    /// Number of entries currently held, expired ones included.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheStoreError> {
        let now = self.clock.now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let found = entries
            .get(key)
            .map(|entry| (entry.expires_at, entry.value.clone()));

        match found {
            Some((expires_at, value)) if now < expires_at => Ok(Some(value)),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheStoreError> {
        let ttl = time::Duration::try_from(ttl).unwrap_or(time::Duration::MAX);
        let expires_at = self.clock.now().saturating_add(ttl);
        mutex_lock(&self.entries, SOURCE, "set")
            .put(key.to_string(), StoredEntry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheStoreError> {
        mutex_lock(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }
}
