//! Book records, their fixed-shape metadata and the taxonomies attached to them.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use time::OffsetDateTime;
use url::Url;

use super::error::DomainError;

pub type BookId = i64;

/// A stored book, without metadata or terms.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookRecord {
    pub id: BookId,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// The metadata bundle every book carries.
///
/// Field names on the wire and in the `book_meta` table follow the catalogue's
/// historical keys (`AuthorName`, `Price`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct BookMeta {
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

/// Column keys of the `book_meta` table, in display order.
pub const META_KEYS: [&str; 6] = ["AuthorName", "Price", "Publisher", "Year", "Edition", "URL"];

impl BookMeta {
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = match key {
            "AuthorName" => &self.author_name,
            "Price" => &self.price,
            "Publisher" => &self.publisher,
            "Year" => &self.year,
            "Edition" => &self.edition,
            "URL" => &self.url,
            _ => return None,
        };
        Some(value.as_str())
    }

    /// Assign a field by its stored key. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "AuthorName" => self.author_name = value,
            "Price" => self.price = value,
            "Publisher" => self.publisher = value,
            "Year" => self.year = value,
            "Edition" => self.edition = value,
            "URL" => self.url = value,
            _ => {}
        }
    }

    /// `(key, value)` pairs in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        META_KEYS
            .into_iter()
            .map(|key| (key, self.get(key).unwrap_or_default()))
    }

    /// Trim every field and check the ones with a constrained format.
    pub fn normalized(self) -> Result<Self, DomainError> {
        let meta = Self {
            author_name: self.author_name.trim().to_string(),
            price: self.price.trim().to_string(),
            publisher: self.publisher.trim().to_string(),
            year: self.year.trim().to_string(),
            edition: self.edition.trim().to_string(),
            url: self.url.trim().to_string(),
        };

        if !meta.price.is_empty() {
            let valid = meta
                .price
                .parse::<f64>()
                .is_ok_and(|price| price.is_finite() && price >= 0.0);
            if !valid {
                return Err(DomainError::validation(format!(
                    "price `{}` must be a non-negative number",
                    meta.price
                )));
            }
        }

        if !meta.year.is_empty() && !meta.year.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation(format!(
                "year `{}` must contain digits only",
                meta.year
            )));
        }

        if !meta.url.is_empty() {
            let parsed = Url::parse(&meta.url).map_err(|err| {
                DomainError::validation(format!("url `{}` is invalid: {err}", meta.url))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(DomainError::validation(format!(
                    "url `{}` must use http or https",
                    meta.url
                )));
            }
        }

        Ok(meta)
    }
}

/// Taxonomies books can be classified under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "book_taxonomy", rename_all = "snake_case")]
pub enum Taxonomy {
    Category,
    Tag,
}

impl Taxonomy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Tag => "tag",
        }
    }
}

impl Display for Taxonomy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Slug used to address a term by URL.
pub fn term_slug(name: &str) -> String {
    slug::slugify(name)
}

/// Deduplicate and trim term names, dropping blanks. First occurrence wins.
pub fn normalize_term_names(names: &[String]) -> Vec<String> {
    let mut seen = Vec::<String>::new();
    let mut result = Vec::new();
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            continue;
        }
        let slug = term_slug(trimmed);
        if slug.is_empty() || seen.contains(&slug) {
            continue;
        }
        seen.push(slug);
        result.push(trimmed.to_string());
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub name: String,
    pub slug: String,
    pub count: i64,
}

/// Flattened, cache-friendly view of a book used by the read API and listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookProjection {
    pub id: BookId,
    pub title: String,
    pub meta: BookMeta,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

impl BookProjection {
    pub fn has_category(&self, needle: &str) -> bool {
        term_matches(&self.categories, needle)
    }

    pub fn has_tag(&self, needle: &str) -> bool {
        term_matches(&self.tags, needle)
    }
}

fn term_matches(terms: &[String], needle: &str) -> bool {
    let needle_slug = term_slug(needle);
    let needle = needle.to_lowercase();
    terms
        .iter()
        .any(|term| term.to_lowercase() == needle || term_slug(term) == needle_slug)
}
