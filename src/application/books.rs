//! Book write service: records, metadata and taxonomy terms.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, UpdateBookParams,
};
use crate::cache::{HookError, MutationHooks};
use crate::domain::books::{BookId, BookMeta, BookRecord, Taxonomy, normalize_term_names};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum BookServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Hook(#[from] HookError),
    #[error("book {0} not found")]
    NotFound(BookId),
}

/// Everything a save writes for one book.
#[derive(Debug, Clone, Default)]
pub struct BookCommand {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub meta: BookMeta,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Autosaves write the record only; metadata and terms keep their stored values.
    pub autosave: bool,
}

struct PreparedCommand {
    title: String,
    content: String,
    excerpt: String,
    details: Option<PreparedDetails>,
}

struct PreparedDetails {
    meta: BookMeta,
    categories: Vec<String>,
    tags: Vec<String>,
}

impl BookCommand {
    fn prepare(self) -> Result<PreparedCommand, DomainError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(DomainError::validation("title must not be empty"));
        }

        let details = if self.autosave {
            None
        } else {
            Some(PreparedDetails {
                meta: self.meta.normalized()?,
                categories: normalize_term_names(&self.categories),
                tags: normalize_term_names(&self.tags),
            })
        };

        Ok(PreparedCommand {
            title,
            content: self.content,
            excerpt: self.excerpt.trim().to_string(),
            details,
        })
    }
}

pub struct BookService {
    reader: Arc<dyn BooksRepo>,
    writer: Arc<dyn BooksWriteRepo>,
    hooks: Arc<MutationHooks>,
}

impl BookService {
    pub fn new(
        reader: Arc<dyn BooksRepo>,
        writer: Arc<dyn BooksWriteRepo>,
        hooks: Arc<MutationHooks>,
    ) -> Self {
        Self {
            reader,
            writer,
            hooks,
        }
    }

    #[instrument(skip(self, command), fields(autosave = command.autosave))]
    pub async fn create(&self, command: BookCommand) -> Result<BookRecord, BookServiceError> {
        let prepared = command.prepare()?;
        let record = self
            .writer
            .create_book(CreateBookParams {
                title: prepared.title,
                content: prepared.content,
                excerpt: prepared.excerpt,
            })
            .await?;

        let details = match prepared.details.as_ref() {
            Some(details) => self.write_details(record.id, details).await,
            None => Ok(()),
        };
        settle(details, self.hooks.book_saved(record.id).await)?;

        info!(book_id = record.id, "Book created");
        Ok(record)
    }

    #[instrument(skip(self, command), fields(autosave = command.autosave))]
    pub async fn update(
        &self,
        id: BookId,
        command: BookCommand,
    ) -> Result<BookRecord, BookServiceError> {
        let prepared = command.prepare()?;
        self.ensure_exists(id).await?;

        let record = self
            .writer
            .update_book(UpdateBookParams {
                id,
                title: prepared.title,
                content: prepared.content,
                excerpt: prepared.excerpt,
            })
            .await
            .map_err(|err| match err {
                RepoError::NotFound => BookServiceError::NotFound(id),
                other => other.into(),
            })?;

        let details = match prepared.details.as_ref() {
            Some(details) => self.write_details(id, details).await,
            None => Ok(()),
        };
        settle(details, self.hooks.book_saved(id).await)?;

        info!(book_id = id, "Book updated");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: BookId) -> Result<(), BookServiceError> {
        self.ensure_exists(id).await?;

        self.writer.delete_meta(id).await?;
        let removed = self.writer.delete_book(id).await.map_err(|err| match err {
            RepoError::NotFound => BookServiceError::NotFound(id),
            other => other.into(),
        });
        settle(removed, self.hooks.book_deleted(id).await)?;

        info!(book_id = id, "Book deleted");
        Ok(())
    }

    async fn ensure_exists(&self, id: BookId) -> Result<(), BookServiceError> {
        match self.reader.find_book(id).await? {
            Some(_) => Ok(()),
            None => Err(BookServiceError::NotFound(id)),
        }
    }

    async fn write_details(
        &self,
        id: BookId,
        details: &PreparedDetails,
    ) -> Result<(), BookServiceError> {
        self.writer.save_meta(id, &details.meta).await?;
        self.writer
            .replace_terms(id, Taxonomy::Category, &details.categories)
            .await?;
        self.writer
            .replace_terms(id, Taxonomy::Tag, &details.tags)
            .await?;
        Ok(())
    }
}

/// Combine the outcome of the writes that followed a committed one with the
/// hook publication that must run regardless. The write error wins.
fn settle(
    written: Result<(), BookServiceError>,
    published: Result<(), HookError>,
) -> Result<(), BookServiceError> {
    written?;
    published?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::cache::{BookEvent, EventKind, MutationListener};
    use crate::infra::memory::MemoryRepositories;

    fn service() -> (BookService, Arc<MemoryRepositories>) {
        let repos = Arc::new(MemoryRepositories::new());
        let hooks = Arc::new(MutationHooks::new());
        let service = BookService::new(repos.clone(), repos.clone(), hooks);
        (service, repos)
    }

    /// Stores records but times out on the follow-up writes.
    struct StallingWriter {
        inner: Arc<MemoryRepositories>,
    }

    #[async_trait]
    impl BooksWriteRepo for StallingWriter {
        async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
            self.inner.create_book(params).await
        }

        async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
            self.inner.update_book(params).await
        }

        async fn delete_book(&self, _id: BookId) -> Result<(), RepoError> {
            Err(RepoError::Timeout)
        }

        async fn save_meta(&self, _id: BookId, _meta: &BookMeta) -> Result<(), RepoError> {
            Err(RepoError::Timeout)
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
            self.inner.replace_terms(id, taxonomy, names).await
        }
    }

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<EventKind>>,
    }

    impl Recording {
        fn seen(&self) -> Vec<EventKind> {
            self.seen.lock().expect("seen lock").clone()
        }
    }

    #[async_trait]
    impl MutationListener for Recording {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn on_mutation(&self, event: &BookEvent) -> Result<(), HookError> {
            self.seen.lock().expect("seen lock").push(event.kind);
            Ok(())
        }
    }

    #[tokio::test]
    async fn failed_follow_up_writes_still_publish() {
        let repos = Arc::new(MemoryRepositories::new());
        let seeded = BookService::new(repos.clone(), repos.clone(), Arc::new(MutationHooks::new()));
        let dune = seeded.create(command("Dune")).await.expect("seed");

        let hooks = Arc::new(MutationHooks::new());
        let recording = Arc::new(Recording::default());
        hooks.register(recording.clone());
        let writer = Arc::new(StallingWriter {
            inner: repos.clone(),
        });
        let service = BookService::new(repos.clone(), writer, hooks);

        let err = service
            .update(dune.id, command("Dune (Revised)"))
            .await
            .expect_err("meta write times out");
        assert!(matches!(err, BookServiceError::Repo(RepoError::Timeout)));

        let err = service
            .create(command("The Hobbit"))
            .await
            .expect_err("meta write times out");
        assert!(matches!(err, BookServiceError::Repo(RepoError::Timeout)));

        let err = service.delete(dune.id).await.expect_err("delete times out");
        assert!(matches!(err, BookServiceError::Repo(RepoError::Timeout)));

        let stored = repos.list_books().await.expect("list");
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].title, "Dune (Revised)");
        assert_eq!(
            recording.seen(),
            vec![
                EventKind::BookSaved { book_id: dune.id },
                EventKind::BookSaved {
                    book_id: stored[1].id
                },
                EventKind::BookDeleted { book_id: dune.id },
            ]
        );
    }

    #[tokio::test]
    async fn rejected_command_publishes_nothing() {
        let repos = Arc::new(MemoryRepositories::new());
        let hooks = Arc::new(MutationHooks::new());
        let recording = Arc::new(Recording::default());
        hooks.register(recording.clone());
        let service = BookService::new(repos.clone(), repos, hooks);

        service.create(command("  ")).await.expect_err("blank title");
        assert!(recording.seen().is_empty());
    }

    fn command(title: &str) -> BookCommand {
        BookCommand {
            title: title.to_string(),
            meta: BookMeta {
                author_name: "Herbert".to_string(),
                price: "9.99".to_string(),
                ..Default::default()
            },
            categories: vec!["SciFi".to_string()],
            tags: vec!["Classic".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_writes_record_meta_and_terms() {
        let (service, repos) = service();
        let record = service.create(command("Dune")).await.expect("create");

        let meta = repos.load_meta(record.id).await.expect("meta").expect("saved");
        assert_eq!(meta.author_name, "Herbert");
        assert_eq!(
            repos
                .list_term_names(record.id, Taxonomy::Category)
                .await
                .expect("categories"),
            vec!["SciFi"]
        );
    }

    #[tokio::test]
    async fn autosave_leaves_meta_untouched() {
        let (service, repos) = service();
        let record = service.create(command("Dune")).await.expect("create");

        let autosave = BookCommand {
            title: "Dune (draft)".to_string(),
            meta: BookMeta::default(),
            autosave: true,
            ..Default::default()
        };
        let updated = service.update(record.id, autosave).await.expect("autosave");

        assert_eq!(updated.title, "Dune (draft)");
        let meta = repos.load_meta(record.id).await.expect("meta").expect("kept");
        assert_eq!(meta.author_name, "Herbert");
        assert_eq!(
            repos
                .list_term_names(record.id, Taxonomy::Tag)
                .await
                .expect("tags"),
            vec!["Classic"]
        );
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let (service, _) = service();
        let err = service.create(command("   ")).await.expect_err("blank title");
        assert!(matches!(err, BookServiceError::Domain(_)));
    }

    #[tokio::test]
    async fn update_and_delete_missing_book_report_not_found() {
        let (service, _) = service();
        assert!(matches!(
            service.update(99, command("Ghost")).await,
            Err(BookServiceError::NotFound(99))
        ));
        assert!(matches!(
            service.delete(99).await,
            Err(BookServiceError::NotFound(99))
        ));
    }

    #[tokio::test]
    async fn delete_removes_book_and_meta() {
        let (service, repos) = service();
        let record = service.create(command("Dune")).await.expect("create");
        service.delete(record.id).await.expect("delete");

        assert!(repos.find_book(record.id).await.expect("find").is_none());
        assert!(repos.load_meta(record.id).await.expect("meta").is_none());
    }
}
