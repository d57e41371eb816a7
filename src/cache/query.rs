//! Read-through cache for the full book list.
//!
//! The list lives under a single fixed key. A read returns the stored payload
//! while it is live; otherwise the list is rebuilt from the book store,
//! published with the configured TTL and returned. Book writes evict the entry
//! through [`MutationListener`], so the next read always rebuilds.
//!
//! Concurrent misses may both rebuild and both publish; the last write wins.
//! A rebuild that started before an eviction may publish afterwards and stay
//! cached until the next eviction or expiry.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use metrics::{counter, histogram};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::application::repos::{BooksRepo, RepoError};
use crate::domain::books::{BookProjection, Taxonomy};

use super::config::CacheConfig;
use super::events::BookEvent;
use super::hooks::{HookError, MutationListener};
use super::keys::CacheKey;
use super::store::{CacheStore, CacheStoreError};

pub(crate) const METRIC_CACHE_HIT: &str = "bookshelf_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "bookshelf_cache_miss_total";
pub(crate) const METRIC_CACHE_EMPTY: &str = "bookshelf_cache_empty_total";
pub(crate) const METRIC_CACHE_INVALIDATE: &str = "bookshelf_cache_invalidate_total";
pub(crate) const METRIC_CACHE_REBUILD_MS: &str = "bookshelf_cache_rebuild_ms";

#[derive(Debug, Error)]
pub enum BookCacheError {
    #[error("book data source failed: {0}")]
    DataSource(#[from] RepoError),
    #[error(transparent)]
    Store(#[from] CacheStoreError),
    #[error("failed to encode book list: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A book list together with the exact JSON bytes stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedBooks {
    pub books: Vec<BookProjection>,
    pub body: Bytes,
}

/// Outcome of a read.
#[derive(Debug, Clone, PartialEq)]
pub enum BookListing {
    Books(CachedBooks),
    /// The store holds no books. This result is never cached.
    Empty,
}

pub struct BookListCache {
    config: CacheConfig,
    store: Arc<dyn CacheStore>,
    books: Arc<dyn BooksRepo>,
}

impl BookListCache {
    pub fn new(config: CacheConfig, store: Arc<dyn CacheStore>, books: Arc<dyn BooksRepo>) -> Self {
        Self {
            config,
            store,
            books,
        }
    }

    /// Serve the book list, rebuilding it on a miss.
    #[instrument(skip(self))]
    pub async fn get_cached_result_set(&self) -> Result<BookListing, BookCacheError> {
        if self.config.enabled {
            if let Some(cached) = self.lookup().await {
                counter!(METRIC_CACHE_HIT).increment(1);
                debug!(books = cached.books.len(), "Book list served from cache");
                return Ok(BookListing::Books(cached));
            }
            counter!(METRIC_CACHE_MISS).increment(1);
        }

        let started_at = Instant::now();
        let books = self.rebuild().await?;
        histogram!(METRIC_CACHE_REBUILD_MS).record(started_at.elapsed().as_secs_f64() * 1000.0);

        if books.is_empty() {
            counter!(METRIC_CACHE_EMPTY).increment(1);
            debug!("Book list rebuild found no books; nothing cached");
            return Ok(BookListing::Empty);
        }

        let body = Bytes::from(serde_json::to_vec(&books)?);
        if self.config.enabled {
            self.publish(body.clone()).await;
        }

        info!(books = books.len(), "Book list rebuilt");
        Ok(BookListing::Books(CachedBooks { books, body }))
    }

    /// Evict the cached book list. The next read rebuilds.
    #[instrument(skip(self))]
    pub async fn invalidate(&self) -> Result<(), BookCacheError> {
        self.store.delete(CacheKey::BookList.as_str()).await?;
        counter!(METRIC_CACHE_INVALIDATE).increment(1);
        debug!("Book list cache entry evicted");
        Ok(())
    }

    async fn lookup(&self) -> Option<CachedBooks> {
        let key = CacheKey::BookList.as_str();
        let body = match self.store.get(key).await {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "Cache store read failed; rebuilding");
                return None;
            }
        };

        match serde_json::from_slice::<Vec<BookProjection>>(&body) {
            Ok(books) => Some(CachedBooks { books, body }),
            Err(err) => {
                warn!(error = %err, "Cached book list is corrupt; discarding");
                if let Err(err) = self.store.delete(key).await {
                    warn!(error = %err, "Failed to discard corrupt book list");
                }
                None
            }
        }
    }

    async fn publish(&self, body: Bytes) {
        let key = CacheKey::BookList.as_str();
        if let Err(err) = self.store.set(key, body, self.config.ttl).await {
            warn!(error = %err, "Cache store write failed; serving uncached book list");
        }
    }

    /// Assemble every projection before anything is published.
    async fn rebuild(&self) -> Result<Vec<BookProjection>, RepoError> {
        let records = self.books.list_books().await?;
        let mut projections = Vec::with_capacity(records.len());

        for record in records {
            let meta = self.books.load_meta(record.id).await?.unwrap_or_default();
            let categories = self
                .books
                .list_term_names(record.id, Taxonomy::Category)
                .await?;
            let tags = self.books.list_term_names(record.id, Taxonomy::Tag).await?;

            projections.push(BookProjection {
                id: record.id,
                title: record.title,
                meta,
                categories,
                tags,
            });
        }

        Ok(projections)
    }
}

#[async_trait]
impl MutationListener for BookListCache {
    fn name(&self) -> &'static str {
        "book_list_cache"
    }

    async fn on_mutation(&self, event: &BookEvent) -> Result<(), HookError> {
        self.invalidate().await.map_err(|err| HookError {
            listener: self.name(),
            message: format!("{err} (event {})", event.id),
        })
    }
}
