//! Cache configuration.
//!
//! Controls the book list cache via the `[cache]` table of `bookshelf.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

// One hour, the lifetime of a rebuilt book list.
const DEFAULT_TTL_SECS: u64 = 60 * 60;
const DEFAULT_CAPACITY: usize = 64;

/// Cache configuration resolved from settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve reads from the cache store. When off, every read rebuilds.
    pub enabled: bool,
    /// Lifetime of a populated entry.
    pub ttl: Duration,
    /// Maximum entries held by the in-memory store.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl: settings.ttl,
            capacity: settings.capacity.get() as usize,
        }
    }
}

impl CacheConfig {
    /// Returns the store capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
