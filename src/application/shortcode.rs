//! `[book ...]` shortcode attributes.
//!
//! A shortcode narrows the cached book list. Attribute values may be double
//! quoted, single quoted or bare; attributes other than the ones below are
//! ignored, as are empty values.

use thiserror::Error;

use crate::domain::books::{BookId, BookProjection};

const TAG: &str = "book";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShortcodeError {
    #[error("expected a `[book ...]` shortcode")]
    NotAShortcode,
    #[error("unterminated quoted value for attribute `{0}`")]
    UnterminatedValue(String),
    #[error("unexpected character `{0}` in shortcode")]
    UnexpectedCharacter(char),
    #[error("attribute `id` must be a book id, got `{0}`")]
    InvalidId(String),
}

/// Filters a shortcode (or the equivalent query string) can express.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcodeAttrs {
    pub id: Option<BookId>,
    pub author_name: Option<String>,
    pub year: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub publisher: Option<String>,
}

impl ShortcodeAttrs {
    /// Parse the full shortcode text, brackets included.
    pub fn parse(text: &str) -> Result<Self, ShortcodeError> {
        let inner = text
            .trim()
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or(ShortcodeError::NotAShortcode)?;
        let inner = inner.strip_suffix('/').unwrap_or(inner);
        let rest = inner
            .strip_prefix(TAG)
            .ok_or(ShortcodeError::NotAShortcode)?;
        if rest.chars().next().is_some_and(|c| !c.is_whitespace()) {
            return Err(ShortcodeError::NotAShortcode);
        }

        let mut attrs = Self::default();
        for (name, value) in parse_pairs(rest)? {
            attrs.assign(&name, value)?;
        }
        Ok(attrs.normalized())
    }

    /// Build attributes from query-string pairs; unknown keys are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, ShortcodeError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut attrs = Self::default();
        for (name, value) in pairs {
            attrs.assign(name, value.to_string())?;
        }
        Ok(attrs.normalized())
    }

    /// Drop blank values and trim the rest.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            id: self.id,
            author_name: clean(self.author_name),
            year: clean(self.year),
            category: clean(self.category),
            tag: clean(self.tag),
            publisher: clean(self.publisher),
        }
    }

    /// Whether a projection satisfies every supplied attribute.
    pub fn matches(&self, book: &BookProjection) -> bool {
        if self.id.is_some_and(|id| id != book.id) {
            return false;
        }
        let meta_matches = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .is_none_or(|wanted| wanted.to_lowercase() == actual.trim().to_lowercase())
        };
        meta_matches(&self.author_name, &book.meta.author_name)
            && meta_matches(&self.year, &book.meta.year)
            && meta_matches(&self.publisher, &book.meta.publisher)
            && self
                .category
                .as_deref()
                .is_none_or(|category| book.has_category(category))
            && self.tag.as_deref().is_none_or(|tag| book.has_tag(tag))
    }

    fn assign(&mut self, name: &str, value: String) -> Result<(), ShortcodeError> {
        match name.to_ascii_lowercase().as_str() {
            "id" => {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    let id = trimmed
                        .parse::<BookId>()
                        .map_err(|_| ShortcodeError::InvalidId(value.clone()))?;
                    self.id = Some(id);
                }
            }
            "author_name" => self.author_name = Some(value),
            "year" => self.year = Some(value),
            "category" => self.category = Some(value),
            "tag" => self.tag = Some(value),
            "publisher" => self.publisher = Some(value),
            _ => {}
        }
        Ok(())
    }
}

fn parse_pairs(input: &str) -> Result<Vec<(String, String)>, ShortcodeError> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else {
            break;
        };
        if !is_name_char(first) {
            return Err(ShortcodeError::UnexpectedCharacter(first));
        }

        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| is_name_char(*c)) {
            name.push(c);
        }

        if chars.next_if_eq(&'=').is_none() {
            // Flag without a value.
            continue;
        }

        let value = match chars.peek().copied() {
            Some(quote @ ('"' | '\'')) => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(ShortcodeError::UnterminatedValue(name)),
                    }
                }
                value
            }
            _ => {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                    value.push(c);
                }
                value
            }
        };
        pairs.push((name, value));
    }

    Ok(pairs)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
