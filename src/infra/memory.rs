//! In-memory repository implementations.
//!
//! Used when no database URL is configured, and as a lightweight backend in
//! tests. State lives for the lifetime of the process.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, SettingsRepo, UpdateBookParams,
    UpdateSettingsParams,
};
use crate::domain::books::{BookId, BookMeta, BookRecord, Taxonomy, TermCount, term_slug};
use crate::domain::settings::BookSettings;

struct StoredTerm {
    id: i64,
    taxonomy: Taxonomy,
    name: String,
    slug: String,
}

struct MemoryState {
    next_book_id: BookId,
    next_term_id: i64,
    books: Vec<BookRecord>,
    meta: HashMap<BookId, BookMeta>,
    terms: Vec<StoredTerm>,
    relationships: Vec<(BookId, i64)>,
    settings: BookSettings,
}

impl MemoryState {
    fn term_ids_for(&self, book_id: BookId) -> impl Iterator<Item = i64> + '_ {
        self.relationships
            .iter()
            .filter(move |(id, _)| *id == book_id)
            .map(|(_, term_id)| *term_id)
    }

    fn book_exists(&self, id: BookId) -> bool {
        self.books.iter().any(|book| book.id == id)
    }
}

pub struct MemoryRepositories {
    state: RwLock<MemoryState>,
}

impl MemoryRepositories {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState {
                next_book_id: 1,
                next_term_id: 1,
                books: Vec::new(),
                meta: HashMap::new(),
                terms: Vec::new(),
                relationships: Vec::new(),
                settings: BookSettings::initial(OffsetDateTime::now_utc()),
            }),
        }
    }
}

impl Default for MemoryRepositories {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BooksRepo for MemoryRepositories {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        Ok(self.state.read().await.books.clone())
    }

    async fn find_book(&self, id: BookId) -> Result<Option<BookRecord>, RepoError> {
        let state = self.state.read().await;
        Ok(state.books.iter().find(|book| book.id == id).cloned())
    }

    async fn load_meta(&self, id: BookId) -> Result<Option<BookMeta>, RepoError> {
        Ok(self.state.read().await.meta.get(&id).cloned())
    }

    async fn list_term_names(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
    ) -> Result<Vec<String>, RepoError> {
        let state = self.state.read().await;
        let mut names: Vec<String> = state
            .term_ids_for(id)
            .filter_map(|term_id| state.terms.iter().find(|term| term.id == term_id))
            .filter(|term| term.taxonomy == taxonomy)
            .map(|term| term.name.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_books_by_term(
        &self,
        taxonomy: Taxonomy,
        slug: &str,
    ) -> Result<Vec<BookRecord>, RepoError> {
        let state = self.state.read().await;
        let Some(term) = state
            .terms
            .iter()
            .find(|term| term.taxonomy == taxonomy && term.slug == slug)
        else {
            return Ok(Vec::new());
        };

        Ok(state
            .books
            .iter()
            .filter(|book| state.relationships.contains(&(book.id, term.id)))
            .cloned()
            .collect())
    }

    async fn term_counts(&self, taxonomy: Taxonomy) -> Result<Vec<TermCount>, RepoError> {
        let state = self.state.read().await;
        let mut counts: Vec<TermCount> = state
            .terms
            .iter()
            .filter(|term| term.taxonomy == taxonomy)
            .map(|term| TermCount {
                name: term.name.clone(),
                slug: term.slug.clone(),
                count: state
                    .relationships
                    .iter()
                    .filter(|(_, term_id)| *term_id == term.id)
                    .count() as i64,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        Ok(counts)
    }
}

#[async_trait]
impl BooksWriteRepo for MemoryRepositories {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let mut state = self.state.write().await;
        let now = OffsetDateTime::now_utc();
        let record = BookRecord {
            id: state.next_book_id,
            title: params.title,
            content: params.content,
            excerpt: params.excerpt,
            created_at: now,
            updated_at: now,
        };
        state.next_book_id += 1;
        state.books.push(record.clone());
        Ok(record)
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
        let mut state = self.state.write().await;
        let book = state
            .books
            .iter_mut()
            .find(|book| book.id == params.id)
            .ok_or(RepoError::NotFound)?;
        book.title = params.title;
        book.content = params.content;
        book.excerpt = params.excerpt;
        book.updated_at = OffsetDateTime::now_utc();
        Ok(book.clone())
    }

    async fn delete_book(&self, id: BookId) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if !state.book_exists(id) {
            return Err(RepoError::NotFound);
        }
        state.books.retain(|book| book.id != id);
        state.relationships.retain(|(book_id, _)| *book_id != id);
        state.meta.remove(&id);
        Ok(())
    }

    async fn save_meta(&self, id: BookId, meta: &BookMeta) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        if !state.book_exists(id) {
            return Err(RepoError::NotFound);
        }
        state.meta.insert(id, meta.clone());
        Ok(())
    }

    async fn delete_meta(&self, id: BookId) -> Result<(), RepoError> {
        self.state.write().await.meta.remove(&id);
        Ok(())
    }

    async fn replace_terms(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
        names: &[String],
    ) -> Result<(), RepoError> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        if !state.book_exists(id) {
            return Err(RepoError::NotFound);
        }

        let taxonomy_terms: Vec<i64> = state
            .terms
            .iter()
            .filter(|term| term.taxonomy == taxonomy)
            .map(|term| term.id)
            .collect();
        state
            .relationships
            .retain(|(book_id, term_id)| *book_id != id || !taxonomy_terms.contains(term_id));

        for name in names {
            let slug = term_slug(name);
            let term_id = match state
                .terms
                .iter()
                .find(|term| term.taxonomy == taxonomy && term.slug == slug)
            {
                Some(term) => term.id,
                None => {
                    let term_id = state.next_term_id;
                    state.next_term_id += 1;
                    state.terms.push(StoredTerm {
                        id: term_id,
                        taxonomy,
                        name: name.clone(),
                        slug,
                    });
                    term_id
                }
            };
            if !state.relationships.contains(&(id, term_id)) {
                state.relationships.push((id, term_id));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SettingsRepo for MemoryRepositories {
    async fn load_settings(&self) -> Result<BookSettings, RepoError> {
        Ok(self.state.read().await.settings.clone())
    }

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<BookSettings, RepoError> {
        let mut state = self.state.write().await;
        state.settings = BookSettings {
            currency: params.currency,
            books_per_page: params.books_per_page,
            updated_at: OffsetDateTime::now_utc(),
        };
        Ok(state.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (MemoryRepositories, BookId, BookId) {
        let repos = MemoryRepositories::new();
        let dune = repos
            .create_book(CreateBookParams {
                title: "Dune".to_string(),
                content: String::new(),
                excerpt: String::new(),
            })
            .await
            .expect("create dune");
        let hobbit = repos
            .create_book(CreateBookParams {
                title: "Hobbit".to_string(),
                content: String::new(),
                excerpt: String::new(),
            })
            .await
            .expect("create hobbit");
        (repos, dune.id, hobbit.id)
    }

    #[tokio::test]
    async fn books_keep_insertion_order() {
        let (repos, dune, hobbit) = seeded().await;
        let ids: Vec<BookId> = repos
            .list_books()
            .await
            .expect("list")
            .into_iter()
            .map(|book| book.id)
            .collect();
        assert_eq!(ids, vec![dune, hobbit]);
    }

    #[tokio::test]
    async fn replace_terms_reuses_terms_by_slug() {
        let (repos, dune, hobbit) = seeded().await;
        repos
            .replace_terms(dune, Taxonomy::Category, &["Sci Fi".to_string()])
            .await
            .expect("dune terms");
        repos
            .replace_terms(hobbit, Taxonomy::Category, &["Fantasy".to_string()])
            .await
            .expect("hobbit terms");
        repos
            .replace_terms(hobbit, Taxonomy::Category, &["Sci Fi".to_string()])
            .await
            .expect("hobbit retagged");

        let books = repos
            .list_books_by_term(Taxonomy::Category, "sci-fi")
            .await
            .expect("by term");
        assert_eq!(books.len(), 2);

        let counts = repos.term_counts(Taxonomy::Category).await.expect("counts");
        assert_eq!(counts[0].name, "Sci Fi");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 0);
    }

    #[tokio::test]
    async fn terms_are_scoped_by_taxonomy() {
        let (repos, dune, _) = seeded().await;
        repos
            .replace_terms(dune, Taxonomy::Category, &["Classic".to_string()])
            .await
            .expect("category");
        repos
            .replace_terms(dune, Taxonomy::Tag, &["Desert".to_string(), "Classic".to_string()])
            .await
            .expect("tags");

        assert_eq!(
            repos
                .list_term_names(dune, Taxonomy::Category)
                .await
                .expect("categories"),
            vec!["Classic"]
        );
        assert_eq!(
            repos
                .list_term_names(dune, Taxonomy::Tag)
                .await
                .expect("tags"),
            vec!["Classic", "Desert"]
        );
    }

    #[tokio::test]
    async fn writes_to_missing_book_fail() {
        let repos = MemoryRepositories::new();
        assert!(matches!(
            repos.save_meta(5, &BookMeta::default()).await,
            Err(RepoError::NotFound)
        ));
        assert!(matches!(repos.delete_book(5).await, Err(RepoError::NotFound)));
    }
}
