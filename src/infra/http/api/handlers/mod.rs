//! API handlers organized by resource type.
//!
//! Helper functions for error conversion are defined here and shared across modules.

mod books;
mod dashboard;
mod settings;

pub use books::*;
pub use dashboard::*;
pub use settings::*;

use axum::http::StatusCode;

use crate::application::books::BookServiceError;
use crate::application::catalog::CatalogError;
use crate::application::repos::RepoError;
use crate::application::settings::SettingsError;
use crate::cache::BookCacheError;
use crate::domain::error::DomainError;

use super::error::{ApiError, codes};

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(msg) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(msg),
        ),
    }
}

fn domain_to_api(err: DomainError, code: &'static str, message: &'static str) -> ApiError {
    match err {
        DomainError::NotFound { .. } => ApiError::not_found("resource not found"),
        DomainError::Validation { message: hint } => {
            ApiError::new(StatusCode::BAD_REQUEST, code, message, Some(hint))
        }
    }
}

pub(crate) fn book_to_api(err: BookServiceError) -> ApiError {
    match err {
        BookServiceError::Domain(domain) => domain_to_api(domain, codes::INVALID_INPUT, "Invalid book"),
        BookServiceError::Repo(repo) => repo_to_api(repo),
        BookServiceError::NotFound(_) => ApiError::not_found("book not found"),
        BookServiceError::Hook(hook) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::HOOK,
            "Book saved but cache refresh failed",
            Some(hook.to_string()),
        ),
    }
}

pub(crate) fn cache_to_api(err: BookCacheError) -> ApiError {
    match err {
        BookCacheError::DataSource(repo) => repo_to_api(repo),
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::CACHE,
            "Book list unavailable",
            Some(other.to_string()),
        ),
    }
}

pub(crate) fn settings_to_api(err: SettingsError) -> ApiError {
    match err {
        SettingsError::Domain(domain) => {
            domain_to_api(domain, codes::SETTINGS, "Invalid settings")
        }
        SettingsError::Repo(repo) => repo_to_api(repo),
    }
}

pub(crate) fn catalog_to_api(err: CatalogError) -> ApiError {
    match err {
        CatalogError::InvalidPage => ApiError::bad_request("invalid page", None),
        CatalogError::Cache(cache) => cache_to_api(cache),
        CatalogError::Repo(repo) => repo_to_api(repo),
    }
}
