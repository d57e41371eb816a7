//! Settings handlers

use axum::Json;
use axum::extract::{Extension, State};
use axum::response::IntoResponse;

use crate::application::api_keys::{ApiPrincipal, Capability};

use super::settings_to_api;
use crate::infra::http::api::error::ApiError;
use crate::infra::http::api::models::{SettingsPatchRequest, settings_patch, settings_response};
use crate::infra::http::api::state::ApiState;

pub async fn get_settings(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::ManageOptions)
        .map_err(|_| ApiError::forbidden(Capability::ManageOptions.as_str()))?;

    let settings = state.settings.load().await.map_err(settings_to_api)?;
    Ok(Json(settings_response(settings)))
}

pub async fn patch_settings(
    State(state): State<ApiState>,
    Extension(principal): Extension<ApiPrincipal>,
    Json(payload): Json<SettingsPatchRequest>,
) -> Result<impl IntoResponse, ApiError> {
    principal
        .requires(Capability::ManageOptions)
        .map_err(|_| ApiError::forbidden(Capability::ManageOptions.as_str()))?;

    let updated = state
        .settings
        .update(settings_patch(payload))
        .await
        .map_err(settings_to_api)?;
    Ok(Json(settings_response(updated)))
}
