//! Shared wiring for integration tests: an in-memory stack with a counting
//! data source and a manual clock behind the cache store.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bookshelf::application::api_keys::{ApiTokens, hash_token};
use bookshelf::application::books::{BookCommand, BookService};
use bookshelf::application::catalog::CatalogService;
use bookshelf::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, UpdateBookParams,
};
use bookshelf::application::settings::SettingsService;
use bookshelf::cache::{
    BookEvent, BookListCache, CacheConfig, HookError, ManualClock, MemoryCacheStore, MutationHooks,
    MutationListener,
};
use bookshelf::config::ApiSettings;
use bookshelf::domain::books::{BookId, BookMeta, BookRecord, Taxonomy, TermCount};
use bookshelf::infra::http::{ApiState, HttpState};
use bookshelf::infra::memory::MemoryRepositories;
use time::macros::datetime;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const EDITOR_TOKEN: &str = "editor-token";

/// Delegates to the in-memory store and counts full list reads.
pub struct CountingRepo {
    inner: Arc<MemoryRepositories>,
    list_calls: AtomicUsize,
}

impl CountingRepo {
    pub fn new(inner: Arc<MemoryRepositories>) -> Self {
        Self {
            inner,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BooksRepo for CountingRepo {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_books().await
    }

    async fn find_book(&self, id: BookId) -> Result<Option<BookRecord>, RepoError> {
        self.inner.find_book(id).await
    }

    async fn load_meta(&self, id: BookId) -> Result<Option<BookMeta>, RepoError> {
        self.inner.load_meta(id).await
    }

    async fn list_term_names(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
    ) -> Result<Vec<String>, RepoError> {
        self.inner.list_term_names(id, taxonomy).await
    }

    async fn list_books_by_term(
        &self,
        taxonomy: Taxonomy,
        slug: &str,
    ) -> Result<Vec<BookRecord>, RepoError> {
        self.inner.list_books_by_term(taxonomy, slug).await
    }

    async fn term_counts(&self, taxonomy: Taxonomy) -> Result<Vec<TermCount>, RepoError> {
        self.inner.term_counts(taxonomy).await
    }
}

/// Delegates every write to the in-memory store until stalled; then the
/// follow-up writes after a record write time out.
pub struct StallingWriter {
    inner: Arc<MemoryRepositories>,
    stalled: AtomicBool,
}

impl StallingWriter {
    pub fn new(inner: Arc<MemoryRepositories>) -> Self {
        Self {
            inner,
            stalled: AtomicBool::new(false),
        }
    }

    pub fn stall(&self) {
        self.stalled.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), RepoError> {
        if self.stalled.load(Ordering::SeqCst) {
            Err(RepoError::Timeout)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BooksWriteRepo for StallingWriter {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        self.inner.create_book(params).await
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
        self.inner.update_book(params).await
    }

    async fn delete_book(&self, id: BookId) -> Result<(), RepoError> {
        self.check()?;
        self.inner.delete_book(id).await
    }

    async fn save_meta(&self, id: BookId, meta: &BookMeta) -> Result<(), RepoError> {
        self.check()?;
        self.inner.save_meta(id, meta).await
    }

    async fn delete_meta(&self, id: BookId) -> Result<(), RepoError> {
        self.inner.delete_meta(id).await
    }

    async fn replace_terms(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
        names: &[String],
    ) -> Result<(), RepoError> {
        self.check()?;
        self.inner.replace_terms(id, taxonomy, names).await
    }
}

/// Listener that always fails, registered after the cache.
pub struct BrokenListener;

#[async_trait]
impl MutationListener for BrokenListener {
    fn name(&self) -> &'static str {
        "broken"
    }

    async fn on_mutation(&self, _event: &BookEvent) -> Result<(), HookError> {
        Err(HookError {
            listener: self.name(),
            message: "search index offline".to_string(),
        })
    }
}

pub struct Harness {
    pub repos: Arc<MemoryRepositories>,
    pub writer: Arc<StallingWriter>,
    pub hooks: Arc<MutationHooks>,
    pub counting: Arc<CountingRepo>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryCacheStore>,
    pub cache: Arc<BookListCache>,
    pub books: Arc<BookService>,
    pub catalog: Arc<CatalogService>,
    pub settings: Arc<SettingsService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        let repos = Arc::new(MemoryRepositories::new());
        let counting = Arc::new(CountingRepo::new(repos.clone()));
        let clock = Arc::new(ManualClock::new(datetime!(2026-03-01 12:00 UTC)));
        let store = Arc::new(MemoryCacheStore::with_clock(&config, clock.clone()));
        let cache = Arc::new(BookListCache::new(config, store.clone(), counting.clone()));

        let hooks = Arc::new(MutationHooks::new());
        hooks.register(cache.clone());

        let writer = Arc::new(StallingWriter::new(repos.clone()));
        let books = Arc::new(BookService::new(
            repos.clone(),
            writer.clone(),
            hooks.clone(),
        ));
        let catalog = Arc::new(CatalogService::new(
            repos.clone(),
            repos.clone(),
            cache.clone(),
        ));
        let settings = Arc::new(SettingsService::new(repos.clone()));

        Self {
            repos,
            writer,
            hooks,
            counting,
            clock,
            store,
            cache,
            books,
            catalog,
            settings,
        }
    }

    pub fn api_state(&self) -> ApiState {
        let tokens = ApiTokens::from_settings(&ApiSettings {
            admin_token_sha256: Some(hash_token(ADMIN_TOKEN)),
            editor_token_sha256: Some(hash_token(EDITOR_TOKEN)),
        });
        ApiState {
            tokens: Arc::new(tokens),
            books: self.books.clone(),
            cache: self.cache.clone(),
            settings: self.settings.clone(),
            catalog: self.catalog.clone(),
            db: None,
        }
    }

    pub fn http_state(&self) -> HttpState {
        HttpState {
            catalog: self.catalog.clone(),
        }
    }

    pub async fn add(&self, command: BookCommand) -> BookId {
        self.books.create(command).await.expect("create book").id
    }
}

pub fn book(title: &str, author: &str, categories: &[&str]) -> BookCommand {
    BookCommand {
        title: title.to_string(),
        meta: BookMeta {
            author_name: author.to_string(),
            price: "12".to_string(),
            ..Default::default()
        },
        categories: categories.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    }
}

pub fn dune() -> BookCommand {
    let mut command = book("Dune", "Frank Herbert", &["Science Fiction"]);
    command.meta.year = "1965".to_string();
    command.meta.publisher = "Chilton".to_string();
    command.tags = vec!["Classic".to_string()];
    command
}

pub fn hobbit() -> BookCommand {
    let mut command = book("The Hobbit", "J. R. R. Tolkien", &["Fantasy"]);
    command.meta.year = "1937".to_string();
    command
}
