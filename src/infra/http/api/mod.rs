pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, put},
};

use crate::infra::http::db_health_response;
use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    let auth_state = state.clone();

    let protected = Router::new()
        .route(
            "/api/v1/books",
            get(handlers::list_books).post(handlers::create_book),
        )
        .route(
            "/api/v1/books/{id}",
            put(handlers::update_book).delete(handlers::delete_book),
        )
        .route(
            "/api/v1/settings",
            get(handlers::get_settings).patch(handlers::patch_settings),
        )
        .route("/api/v1/dashboard", get(handlers::get_dashboard))
        .layer(axum_middleware::from_fn_with_state(
            auth_state,
            middleware::api_auth,
        ));

    Router::new()
        .route("/api/v1/health", get(api_health))
        .merge(protected)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}

async fn api_health(State(state): State<ApiState>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
