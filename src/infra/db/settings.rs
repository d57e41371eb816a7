use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{RepoError, SettingsRepo, UpdateSettingsParams},
    domain::settings::{BookSettings, Currency},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct BookSettingsRow {
    currency: String,
    books_per_page: i32,
    updated_at: OffsetDateTime,
}

impl TryFrom<BookSettingsRow> for BookSettings {
    type Error = RepoError;

    fn try_from(row: BookSettingsRow) -> Result<Self, Self::Error> {
        let currency = row
            .currency
            .parse::<Currency>()
            .map_err(|err| RepoError::InvalidInput {
                message: err.to_string(),
            })?;
        let books_per_page =
            u32::try_from(row.books_per_page).map_err(|_| RepoError::InvalidInput {
                message: format!("stored books_per_page {} is negative", row.books_per_page),
            })?;

        Ok(Self {
            currency,
            books_per_page,
            updated_at: row.updated_at,
        })
    }
}

#[async_trait]
impl SettingsRepo for PostgresRepositories {
    async fn load_settings(&self) -> Result<BookSettings, RepoError> {
        let row = sqlx::query_as::<_, BookSettingsRow>(
            r#"
            SELECT currency, books_per_page, updated_at
            FROM book_settings
            WHERE id = 1
            "#,
        )
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => row.try_into(),
            None => Ok(BookSettings::initial(OffsetDateTime::now_utc())),
        }
    }

    async fn update_settings(
        &self,
        params: UpdateSettingsParams,
    ) -> Result<BookSettings, RepoError> {
        let books_per_page =
            i32::try_from(params.books_per_page).map_err(|_| RepoError::InvalidInput {
                message: "books_per_page out of range".to_string(),
            })?;

        let row = sqlx::query_as::<_, BookSettingsRow>(
            r#"
            INSERT INTO book_settings (id, currency, books_per_page, updated_at)
            VALUES (1, $1, $2, now())
            ON CONFLICT (id)
            DO UPDATE SET currency = EXCLUDED.currency,
                          books_per_page = EXCLUDED.books_per_page,
                          updated_at = EXCLUDED.updated_at
            RETURNING currency, books_per_page, updated_at
            "#,
        )
        .bind(params.currency.as_str())
        .bind(books_per_page)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.try_into()
    }
}
