use crate::application::error::HttpError;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::domain::books::{BookId, BookProjection};
use crate::domain::settings::BookSettings;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

/// One book as shown by the shortcode listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookCard {
    pub id: BookId,
    pub title: String,
    pub author_name: String,
    pub price: String,
    pub publisher: String,
    pub year: String,
    pub edition: String,
    pub url: String,
    pub categories: String,
    pub tags: String,
}

impl BookCard {
    pub fn from_projection(book: &BookProjection, settings: &BookSettings) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author_name: book.meta.author_name.clone(),
            price: settings.format_price(&book.meta.price),
            publisher: book.meta.publisher.clone(),
            year: book.meta.year.clone(),
            edition: book.meta.edition.clone(),
            url: book.meta.url.clone(),
            categories: book.categories.join(", "),
            tags: book.tags.join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub category: String,
    /// `false` when no category slug was given; the widget then renders only its heading.
    pub configured: bool,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListView {
    pub cards: Vec<BookCard>,
    pub total: usize,
    pub page: u32,
    pub total_pages: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    /// Query prefix (already url-encoded, ending in `&` when non-empty) for page links.
    pub page_query: String,
}

impl BookListView {
    pub fn has_results(&self) -> bool {
        !self.cards.is_empty()
    }
}

#[derive(Template)]
#[template(path = "widgets/books.html")]
pub struct BookWidgetTemplate {
    pub view: WidgetView,
}

#[derive(Template)]
#[template(path = "partials/book_list.html")]
pub struct BookListTemplate {
    pub view: BookListView,
}
