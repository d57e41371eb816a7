use async_trait::async_trait;
use sqlx::FromRow;
use time::OffsetDateTime;

use crate::application::repos::{
    BooksRepo, BooksWriteRepo, CreateBookParams, RepoError, UpdateBookParams,
};
use crate::domain::books::{BookId, BookMeta, BookRecord, Taxonomy, TermCount, term_slug};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(FromRow)]
struct BookRow {
    id: i64,
    title: String,
    content: String,
    excerpt: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct MetaRow {
    meta_key: String,
    meta_value: String,
}

#[derive(FromRow)]
struct TermCountRow {
    name: String,
    slug: String,
    count: i64,
}

#[async_trait]
impl BooksRepo for PostgresRepositories {
    async fn list_books(&self) -> Result<Vec<BookRecord>, RepoError> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, content, excerpt, created_at, updated_at
            FROM books
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_book(&self, id: BookId) -> Result<Option<BookRecord>, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT id, title, content, excerpt, created_at, updated_at
            FROM books
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(Into::into))
    }

    async fn load_meta(&self, id: BookId) -> Result<Option<BookMeta>, RepoError> {
        let rows = sqlx::query_as::<_, MetaRow>(
            r#"
            SELECT meta_key, meta_value
            FROM book_meta
            WHERE book_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if rows.is_empty() {
            return Ok(None);
        }

        let mut meta = BookMeta::default();
        for row in rows {
            meta.set(&row.meta_key, row.meta_value);
        }
        Ok(Some(meta))
    }

    async fn list_term_names(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
    ) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT t.name
            FROM book_terms t
            INNER JOIN book_term_relationships r ON r.term_id = t.id
            WHERE r.book_id = $1 AND t.taxonomy = $2
            ORDER BY t.name ASC
            "#,
        )
        .bind(id)
        .bind(taxonomy)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)
    }

    async fn list_books_by_term(
        &self,
        taxonomy: Taxonomy,
        slug: &str,
    ) -> Result<Vec<BookRecord>, RepoError> {
        let rows = sqlx::query_as::<_, BookRow>(
            r#"
            SELECT b.id, b.title, b.content, b.excerpt, b.created_at, b.updated_at
            FROM books b
            INNER JOIN book_term_relationships r ON r.book_id = b.id
            INNER JOIN book_terms t ON t.id = r.term_id
            WHERE t.taxonomy = $1 AND t.slug = $2
            ORDER BY b.id ASC
            "#,
        )
        .bind(taxonomy)
        .bind(slug)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn term_counts(&self, taxonomy: Taxonomy) -> Result<Vec<TermCount>, RepoError> {
        let rows = sqlx::query_as::<_, TermCountRow>(
            r#"
            SELECT t.name, t.slug, COUNT(r.book_id) AS count
            FROM book_terms t
            LEFT JOIN book_term_relationships r ON r.term_id = t.id
            WHERE t.taxonomy = $1
            GROUP BY t.id, t.name, t.slug
            ORDER BY count DESC, t.name ASC
            "#,
        )
        .bind(taxonomy)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TermCount {
                name: row.name,
                slug: row.slug,
                count: row.count,
            })
            .collect())
    }
}

#[async_trait]
impl BooksWriteRepo for PostgresRepositories {
    async fn create_book(&self, params: CreateBookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            INSERT INTO books (title, content, excerpt)
            VALUES ($1, $2, $3)
            RETURNING id, title, content, excerpt, created_at, updated_at
            "#,
        )
        .bind(&params.title)
        .bind(&params.content)
        .bind(&params.excerpt)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_book(&self, params: UpdateBookParams) -> Result<BookRecord, RepoError> {
        let row = sqlx::query_as::<_, BookRow>(
            r#"
            UPDATE books
            SET title = $2,
                content = $3,
                excerpt = $4,
                updated_at = now()
            WHERE id = $1
            RETURNING id, title, content, excerpt, created_at, updated_at
            "#,
        )
        .bind(params.id)
        .bind(&params.title)
        .bind(&params.content)
        .bind(&params.excerpt)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(Into::into).ok_or(RepoError::NotFound)
    }

    async fn delete_book(&self, id: BookId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn save_meta(&self, id: BookId, meta: &BookMeta) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        for (key, value) in meta.entries() {
            sqlx::query(
                r#"
                INSERT INTO book_meta (book_id, meta_key, meta_value)
                VALUES ($1, $2, $3)
                ON CONFLICT (book_id, meta_key)
                DO UPDATE SET meta_value = EXCLUDED.meta_value
                "#,
            )
            .bind(id)
            .bind(key)
            .bind(value)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn delete_meta(&self, id: BookId) -> Result<(), RepoError> {
        sqlx::query("DELETE FROM book_meta WHERE book_id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn replace_terms(
        &self,
        id: BookId,
        taxonomy: Taxonomy,
        names: &[String],
    ) -> Result<(), RepoError> {
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            DELETE FROM book_term_relationships r
            USING book_terms t
            WHERE r.term_id = t.id AND r.book_id = $1 AND t.taxonomy = $2
            "#,
        )
        .bind(id)
        .bind(taxonomy)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        for name in names {
            let term_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO book_terms (taxonomy, name, slug)
                VALUES ($1, $2, $3)
                ON CONFLICT (taxonomy, slug)
                DO UPDATE SET slug = EXCLUDED.slug
                RETURNING id
                "#,
            )
            .bind(taxonomy)
            .bind(name)
            .bind(term_slug(name))
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            sqlx::query(
                r#"
                INSERT INTO book_term_relationships (book_id, term_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(term_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        }

        tx.commit().await.map_err(map_sqlx_error)
    }
}
