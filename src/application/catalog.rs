//! Read-side catalogue views: the category widget, shortcode listings and the
//! dashboard summary.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;
use url::form_urlencoded;

use crate::application::repos::{BooksRepo, RepoError, SettingsRepo};
use crate::application::shortcode::ShortcodeAttrs;
use crate::cache::{BookCacheError, BookListCache, BookListing};
use crate::domain::books::{Taxonomy, TermCount};
use crate::presentation::views::{BookCard, BookListView, WidgetView};

pub const TOP_CATEGORY_LIMIT: usize = 5;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error(transparent)]
    Cache(#[from] BookCacheError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BooksRepo>,
    settings: Arc<dyn SettingsRepo>,
    cache: Arc<BookListCache>,
}

impl CatalogService {
    pub fn new(
        books: Arc<dyn BooksRepo>,
        settings: Arc<dyn SettingsRepo>,
        cache: Arc<BookListCache>,
    ) -> Self {
        Self {
            books,
            settings,
            cache,
        }
    }

    /// Titles of the books filed under a category slug.
    #[instrument(skip(self))]
    pub async fn books_in_category(&self, slug: &str) -> Result<WidgetView, CatalogError> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(WidgetView {
                category: String::new(),
                configured: false,
                titles: Vec::new(),
            });
        }

        let titles = self
            .books
            .list_books_by_term(Taxonomy::Category, slug)
            .await?
            .into_iter()
            .map(|book| book.title)
            .collect();

        Ok(WidgetView {
            category: slug.to_string(),
            configured: true,
            titles,
        })
    }

    /// One page of the cached book list narrowed by shortcode attributes.
    #[instrument(skip(self, page_query))]
    pub async fn shortcode_listing(
        &self,
        attrs: &ShortcodeAttrs,
        page: u32,
        page_query: &[(&str, &str)],
    ) -> Result<BookListView, CatalogError> {
        if page == 0 {
            return Err(CatalogError::InvalidPage);
        }

        let settings = self.settings.load_settings().await?;
        let matching: Vec<_> = match self.cache.get_cached_result_set().await? {
            BookListing::Books(cached) => cached
                .books
                .into_iter()
                .filter(|book| attrs.matches(book))
                .collect(),
            BookListing::Empty => Vec::new(),
        };

        let per_page = settings.books_per_page.max(1) as usize;
        let total = matching.len();
        let total_pages = u32::try_from(total.div_ceil(per_page)).unwrap_or(u32::MAX);
        let offset = (page as usize - 1).saturating_mul(per_page);
        let cards = matching
            .iter()
            .skip(offset)
            .take(per_page)
            .map(|book| BookCard::from_projection(book, &settings))
            .collect();

        Ok(BookListView {
            cards,
            total,
            page,
            total_pages,
            prev_page: (page > 1).then(|| page - 1),
            next_page: (page < total_pages).then(|| page + 1),
            page_query: encode_page_query(page_query),
        })
    }

    /// The most used categories, ties broken by name.
    #[instrument(skip(self))]
    pub async fn top_categories(&self) -> Result<Vec<TermCount>, CatalogError> {
        let mut counts = self.books.term_counts(Taxonomy::Category).await?;
        counts.retain(|term| term.count > 0);
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        counts.truncate(TOP_CATEGORY_LIMIT);
        Ok(counts)
    }
}

fn encode_page_query(pairs: &[(&str, &str)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs.iter().filter(|(key, _)| *key != "page") {
        serializer.append_pair(key, value);
    }
    let mut query = serializer.finish();
    if !query.is_empty() {
        query.push('&');
    }
    query
}
