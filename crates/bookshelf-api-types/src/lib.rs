//! Wire types shared by the Bookshelf admin API and its clients.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Book metadata as it travels over the wire, keyed by the catalogue's field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMetaFields {
    #[serde(rename = "AuthorName")]
    pub author_name: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Publisher")]
    pub publisher: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Edition")]
    pub edition: String,
    #[serde(rename = "URL")]
    pub url: String,
}

/// Body of `POST /api/v1/books` and `PUT /api/v1/books/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookWriteRequest {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub meta: BookMetaFields,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Autosaves keep the stored metadata and terms untouched.
    #[serde(default)]
    pub autosave: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsPatchRequest {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub books_per_page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub currency: String,
    pub currency_symbol: String,
    pub books_per_page: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCountResponse {
    pub name: String,
    pub slug: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub top_categories: Vec<TermCountResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub hint: Option<String>,
}
