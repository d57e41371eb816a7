mod support;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use bookshelf::infra::http::{build_api_router, build_public_router};
use bookshelf_api_types::{ApiErrorBody, BookResponse, DashboardResponse, SettingsResponse};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use std::sync::Arc;

use support::{ADMIN_TOKEN, BrokenListener, EDITOR_TOKEN, Harness, dune, hobbit};

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let request = builder.body(body).expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

#[tokio::test]
async fn health_needs_no_token() {
    let app = build_api_router(Harness::new().api_state());
    let response = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn missing_or_unknown_token_is_unauthorized() {
    let app = build_api_router(Harness::new().api_state());

    let response = send(&app, Method::GET, "/api/v1/books", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.code, "unauthorized");

    let response = send(&app, Method::GET, "/api/v1/books", Some("nope"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn x_api_key_header_is_accepted() {
    let app = build_api_router(Harness::new().api_state());
    let request = Request::builder()
        .uri("/api/v1/settings")
        .header("x-api-key", ADMIN_TOKEN)
        .body(Body::empty())
        .expect("request should build");
    let response = app.oneshot(request).await.expect("router should respond");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn editor_cannot_read_the_book_list_or_settings() {
    let app = build_api_router(Harness::new().api_state());

    for uri in ["/api/v1/books", "/api/v1/settings"] {
        let response = send(&app, Method::GET, uri, Some(EDITOR_TOKEN), None).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        let body: ApiErrorBody =
            serde_json::from_slice(&body_bytes(response).await).expect("error body");
        assert_eq!(body.error.code, "forbidden");
        assert_eq!(body.error.hint.as_deref(), Some("manage_options"));
    }

    let response = send(&app, Method::GET, "/api/v1/dashboard", Some(EDITOR_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn empty_catalogue_answers_no_content() {
    let app = build_api_router(Harness::new().api_state());
    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn list_serves_the_cached_bytes() {
    let harness = Harness::new();
    harness.add(dune()).await;
    let app = build_api_router(harness.api_state());

    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
        Some(&b"application/json"[..])
    );
    let served = body_bytes(response).await;

    let bookshelf::cache::BookListing::Books(cached) =
        harness.cache.get_cached_result_set().await.expect("cache read")
    else {
        panic!("expected books");
    };
    assert_eq!(served, cached.body.to_vec());
    assert_eq!(harness.counting.list_calls(), 1);
}

#[tokio::test]
async fn writes_through_the_api_invalidate_the_list() {
    let harness = Harness::new();
    harness.add(dune()).await;
    let app = build_api_router(harness.api_state());

    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    let before: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(before.as_array().map(Vec::len), Some(1));

    let response = send(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(EDITOR_TOKEN),
        Some(json!({
            "title": "The Hobbit",
            "meta": { "AuthorName": "J. R. R. Tolkien", "Price": "9.5" },
            "categories": ["Fantasy"]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: BookResponse =
        serde_json::from_slice(&body_bytes(response).await).expect("book body");
    assert_eq!(created.title, "The Hobbit");

    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    let after: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(after[1]["title"], "The Hobbit");
    assert_eq!(after[1]["meta"]["AuthorName"], "J. R. R. Tolkien");
    assert_eq!(after[1]["categories"], json!(["Fantasy"]));

    let uri = format!("/api/v1/books/{}", created.id);
    let response = send(&app, Method::DELETE, &uri, Some(EDITOR_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    let last: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(last.as_array().map(Vec::len), Some(1));
    assert_eq!(harness.counting.list_calls(), 3);
}

#[tokio::test]
async fn failing_listener_reports_hook_error_after_the_write() {
    let harness = Harness::new();
    harness.add(dune()).await;
    harness.hooks.register(Arc::new(BrokenListener));
    let app = build_api_router(harness.api_state());

    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(EDITOR_TOKEN),
        Some(json!({ "title": "The Hobbit" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.code, "hook_error");
    assert!(
        body.error
            .hint
            .as_deref()
            .is_some_and(|hint| hint.contains("broken"))
    );

    // The cache listener ran before the broken one, so the write is visible.
    let response = send(&app, Method::GET, "/api/v1/books", Some(ADMIN_TOKEN), None).await;
    let listed: Value = serde_json::from_slice(&body_bytes(response).await).expect("json");
    assert_eq!(listed.as_array().map(Vec::len), Some(2));
    assert_eq!(listed[1]["title"], "The Hobbit");
}

#[tokio::test]
async fn update_and_delete_of_missing_book_are_not_found() {
    let app = build_api_router(Harness::new().api_state());

    let response = send(
        &app,
        Method::PUT,
        "/api/v1/books/42",
        Some(ADMIN_TOKEN),
        Some(json!({ "title": "Ghost" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, Method::DELETE, "/api/v1/books/42", Some(ADMIN_TOKEN), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_book_is_rejected() {
    let app = build_api_router(Harness::new().api_state());
    let response = send(
        &app,
        Method::POST,
        "/api/v1/books",
        Some(EDITOR_TOKEN),
        Some(json!({ "title": "Priceless", "meta": { "Price": "free" } })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ApiErrorBody =
        serde_json::from_slice(&body_bytes(response).await).expect("error body");
    assert_eq!(body.error.code, "invalid_input");
}

#[tokio::test]
async fn settings_patch_round_trips() {
    let app = build_api_router(Harness::new().api_state());

    let response = send(
        &app,
        Method::PATCH,
        "/api/v1/settings",
        Some(ADMIN_TOKEN),
        Some(json!({ "currency": "inr", "books_per_page": 5 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let settings: SettingsResponse =
        serde_json::from_slice(&body_bytes(response).await).expect("settings body");
    assert_eq!(settings.currency, "inr");
    assert_eq!(settings.currency_symbol, "Rs.");
    assert_eq!(settings.books_per_page, 5);

    let response = send(
        &app,
        Method::PATCH,
        "/api/v1/settings",
        Some(ADMIN_TOKEN),
        Some(json!({ "books_per_page": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn dashboard_lists_top_categories() {
    let harness = Harness::new();
    harness.add(dune()).await;
    harness.add(hobbit()).await;
    harness
        .add(support::book("Foundation", "Isaac Asimov", &["Science Fiction"]))
        .await;
    let app = build_api_router(harness.api_state());

    let response = send(&app, Method::GET, "/api/v1/dashboard", Some(ADMIN_TOKEN), None).await;
    let dashboard: DashboardResponse =
        serde_json::from_slice(&body_bytes(response).await).expect("dashboard body");
    let ranked: Vec<(&str, i64)> = dashboard
        .top_categories
        .iter()
        .map(|term| (term.name.as_str(), term.count))
        .collect();
    assert_eq!(ranked, vec![("Science Fiction", 2), ("Fantasy", 1)]);
}

#[tokio::test]
async fn public_widget_and_listing_render_html() {
    let harness = Harness::new();
    harness.add(dune()).await;
    harness.add(hobbit()).await;
    let app = build_public_router(harness.http_state());

    let response = send(&app, Method::GET, "/widgets/books/fantasy", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("The Hobbit"));
    assert!(!html.contains("Dune"));

    let response = send(&app, Method::GET, "/books?author_name=frank%20herbert", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Dune"));
    assert!(!html.contains("The Hobbit"));

    let response = send(
        &app,
        Method::GET,
        "/books/shortcode?code=%5Bbook%20category%3Dpoetry%5D",
        None,
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("no book found"));

    let response = send(&app, Method::GET, "/books?page=0", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, Method::GET, "/books/shortcode?code=%5Bgallery%5D", None, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
