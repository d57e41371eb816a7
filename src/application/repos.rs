//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::books::{BookId, BookMeta, BookRecord, Taxonomy, TermCount};
use crate::domain::settings::{BookSettings, Currency};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookParams {
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

#[derive(Debug, Clone)]
pub struct UpdateBookParams {
    pub id: BookId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UpdateSettingsParams {
    pub currency: Currency,
    pub books_per_page: u32,
}

/// Read side of the book store.
#[async_trait]
pub trait BooksRepo: Send + Sync {
    /// All books, in the store's natural order (oldest first).
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError>;

    async fn find_book(&self, id: BookId) -> Result<Option<BookRecord>, RepoError>;

    /// The metadata bundle of a book, `None` when nothing has been saved yet.
    async fn load_meta(&self, id: BookId) -> Result<Option<BookMeta>, RepoError>;

    /// Names of the terms attached to a book, ordered by name.
    async fn list_term_names(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
    ) -> Result<Vec<String>, RepoError>;

    /// Books attached to the term with the given slug, in store order.
    async fn list_books_by_term(
        &self,
        taxonomy: Taxonomy,
        slug: &str,
    ) -> Result<Vec<BookRecord>, RepoError>;

    /// Usage counts of every term in a taxonomy, most used first.
    async fn term_counts(&self, taxonomy: Taxonomy) -> Result<Vec<TermCount>, RepoError>;
}

#[async_trait]
pub trait BooksWriteRepo: Send + Sync {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError>;

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError>;

    async fn delete_book(&self, id: BookId) -> Result<(), RepoError>;

    async fn save_meta(&self, id: BookId, meta: &BookMeta) -> Result<(), RepoError>;

    async fn delete_meta(&self, id: BookId) -> Result<(), RepoError>;

    /// Replace the terms of one taxonomy on a book, creating missing terms.
    async fn replace_terms(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
        names: &[String],
    ) -> Result<(), RepoError>;
}

#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn load_settings(&self) -> Result<BookSettings, RepoError>;

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<BookSettings, RepoError>;
}
