//! Bookshelf cache system.
//!
//! The book list served by the admin API is kept in a [`CacheStore`] under a
//! single fixed key and evicted whenever a book is written:
//!
//! - [`BookListCache`] reads through the store and rebuilds on a miss
//! - [`MutationHooks`] delivers book write events to registered listeners
//! - [`MemoryCacheStore`] is the in-process store used by the server
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 3600
//! capacity = 64
//! ```

mod clock;
mod config;
mod events;
mod hooks;
mod keys;
mod lock;
mod query;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use events::{BookEvent, Epoch, EventKind};
pub use hooks::{HookError, MutationHooks, MutationListener};
pub use keys::CacheKey;
pub use query::{BookCacheError, BookListCache, BookListing, CachedBooks};
pub use store::{CacheStore, CacheStoreError, MemoryCacheStore};

pub(crate) use query::{
    METRIC_CACHE_EMPTY, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE, METRIC_CACHE_MISS,
    METRIC_CACHE_REBUILD_MS,
};
