use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;

use crate::{
    application::{
        catalog::{CatalogError, CatalogService},
        error::HttpError,
        shortcode::ShortcodeAttrs,
    },
    presentation::views::{
        BookListTemplate, BookWidgetTemplate, render_template_response,
    },
};

use super::{
    middleware::{log_responses, set_request_context},
    repo_error_to_http,
};

#[derive(Clone)]
pub struct HttpState {
    pub catalog: Arc<CatalogService>,
}

pub fn build_public_router(state: HttpState) -> Router {
    Router::new()
        .route("/widgets/books", get(unconfigured_widget))
        .route("/widgets/books/{category}", get(category_widget))
        .route("/books", get(book_list))
        .route("/books/shortcode", get(shortcode_list))
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ShortcodeQuery {
    code: String,
    page: Option<u32>,
}

async fn unconfigured_widget(State(state): State<HttpState>) -> Response {
    category_widget(State(state), Path(String::new())).await
}

async fn category_widget(State(state): State<HttpState>, Path(category): Path<String>) -> Response {
    match state.catalog.books_in_category(&category).await {
        Ok(view) => render_template_response(BookWidgetTemplate { view }, StatusCode::OK),
        Err(err) => catalog_error_to_response(err),
    }
}

/// Listing filtered by query-string attributes, e.g. `/books?author_name=herbert&page=2`.
async fn book_list(
    State(state): State<HttpState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let borrowed: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let page = match parse_page(borrowed.iter().find(|(key, _)| *key == "page").map(|p| p.1)) {
        Ok(page) => page,
        Err(err) => return err.into_response(),
    };
    let attrs = match ShortcodeAttrs::from_pairs(borrowed.iter().copied()) {
        Ok(attrs) => attrs,
        Err(err) => return HttpError::from(err).into_response(),
    };

    render_listing(&state, &attrs, page, &borrowed).await
}

async fn shortcode_list(
    State(state): State<HttpState>,
    Query(query): Query<ShortcodeQuery>,
) -> Response {
    let attrs = match ShortcodeAttrs::parse(&query.code) {
        Ok(attrs) => attrs,
        Err(err) => return HttpError::from(err).into_response(),
    };
    let page = query.page.unwrap_or(1);

    render_listing(&state, &attrs, page, &[("code", query.code.as_str())]).await
}

async fn render_listing(
    state: &HttpState,
    attrs: &ShortcodeAttrs,
    page: u32,
    page_query: &[(&str, &str)],
) -> Response {
    match state.catalog.shortcode_listing(attrs, page, page_query).await {
        Ok(view) => render_template_response(BookListTemplate { view }, StatusCode::OK),
        Err(err) => catalog_error_to_response(err),
    }
}

fn parse_page(raw: Option<&str>) -> Result<u32, HttpError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(1),
        Some(value) => value.parse::<u32>().map_err(|err| {
            HttpError::from_error(
                "infra::http::public::parse_page",
                StatusCode::BAD_REQUEST,
                "Invalid page",
                &err,
            )
        }),
    }
}

fn catalog_error_to_response(err: CatalogError) -> Response {
    match err {
        CatalogError::Repo(repo) => {
            repo_error_to_http("infra::http::public::catalog", repo).into_response()
        }
        other => HttpError::from(other).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_first() {
        assert_eq!(parse_page(None).expect("default"), 1);
        assert_eq!(parse_page(Some(" ")).expect("blank"), 1);
        assert_eq!(parse_page(Some("3")).expect("three"), 3);
        assert!(parse_page(Some("-1")).is_err());
    }
}
