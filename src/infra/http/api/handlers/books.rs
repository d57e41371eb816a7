//! Book handlers

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::application::api_keys::{ApiPrincipal, Capability};
use crate::cache::BookListing;
use crate::domain::books::BookId;

use super::{book_to_api, cache_to_api};
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{BookWriteRequest, book_command, book_response};
use crate::infra::http::api::state::ApiState;

/// The cached book list, served as the exact bytes held by the cache.
pub async fn list_books(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<Response, ApiError> {
    principal
        .requires(Capability::ManageOptions)
        .map_err(|_| ApiError::forbidden(Capability::ManageOptions.as_str()))?;

    match state
        .cache
        .get_cached_result_set()
        .await
        .map_err(cache_to_api)?
    {
        BookListing::Books(cached) => {
            Ok(([(CONTENT_TYPE, "application/json")], cached.body).into_response())
        }
        BookListing::Empty => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn create_book(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    Json(payload): Json<BookWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::EditBooks)
        .map_err(|_| ApiError::forbidden(Capability::EditBooks.as_str()))?;

    let record = state
        .books
        .create(book_command(payload))
        .await
        .map_err(book_to_api)?;
    Ok((StatusCode::CREATED, Json(book_response(record))))
}

pub async fn update_book(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<BookId>,
    Json(payload): Json<BookWriteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::EditBooks)
        .map_err(|_| ApiError::forbidden(Capability::EditBooks.as_str()))?;

    let record = state
        .books
        .update(id, book_command(payload))
        .await
        .map_err(book_to_api)?;
    Ok(Json(book_response(record)))
}

pub async fn delete_book(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    Path(id): Path<BookId>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::EditBooks)
        .map_err(|_| ApiError::forbidden(Capability::EditBooks.as_str()))?;

    state.books.delete(id).await.map_err(book_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
