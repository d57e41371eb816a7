use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::repos::{RepoError, SettingsRepo, UpdateSettingsParams};
use crate::domain::error::DomainError;
use crate::domain::settings::{BookSettings, Currency, validate_books_per_page};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub currency: Option<String>,
    pub books_per_page: Option<u32>,
}

#[derive(Clone)]
pub struct SettingsService {
    repo: Arc<dyn SettingsRepo>,
}

impl SettingsService {
    pub fn new(repo: Arc<dyn SettingsRepo>) -> Self {
        Self { repo }
    }

    pub async fn load(&self) -> Result<BookSettings, SettingsError> {
        Ok(self.repo.load_settings().await?)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, patch: SettingsPatch) -> Result<BookSettings, SettingsError> {
        let current = self.repo.load_settings().await?;

        let currency = match patch.currency.as_deref() {
            Some(raw) => raw.parse::<Currency>()?,
            None => current.currency,
        };
        let books_per_page = match patch.books_per_page {
            Some(value) => validate_books_per_page(value)?,
            None => current.books_per_page,
        };

        let updated = self
            .repo
            .update_settings(UpdateSettingsParams {
                currency,
                books_per_page,
            })
            .await?;
        info!(
            currency = updated.currency.as_str(),
            books_per_page = updated.books_per_page,
            "Book settings updated"
        );
        Ok(updated)
    }
}
