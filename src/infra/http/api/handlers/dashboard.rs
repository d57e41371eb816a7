//! Dashboard handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::api_keys::{ApiPrincipal, Capability};

use super::catalog_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::dashboard_response;
use crate::infra::http::api::state::ApiState;

/// Top categories by book count.
pub async fn get_dashboard(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::EditBooks)
        .map_err(|_| ApiError::forbidden(Capability::EditBooks.as_str()))?;

    let top = state
        .catalog
        .top_categories()
        .await
        .map_err(catalog_to_api)?;
    Ok(Json(dashboard_response(top)))
}
