//! Catalogue-wide display settings.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;
use time::OffsetDateTime;

use super::error::DomainError;

pub const DEFAULT_BOOKS_PER_PAGE: u32 = 10;
pub const MAX_BOOKS_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    #[default]
    Usd,
    Inr,
}

impl Currency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Usd => "usd",
            Self::Inr => "inr",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Inr => "Rs.",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "usd" | "$" => Ok(Self::Usd),
            "inr" | "rs." | "rs" => Ok(Self::Inr),
            other => Err(DomainError::validation(format!(
                "unknown currency `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSettings {
    pub currency: Currency,
    pub books_per_page: u32,
    pub updated_at: OffsetDateTime,
}

impl BookSettings {
    /// Settings used before anything has been stored.
    pub fn initial(now: OffsetDateTime) -> Self {
        Self {
            currency: Currency::default(),
            books_per_page: DEFAULT_BOOKS_PER_PAGE,
            updated_at: now,
        }
    }

    /// Render a stored price with the configured currency symbol.
    pub fn format_price(&self, price: &str) -> String {
        if price.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.currency.symbol(), price)
        }
    }
}

pub fn validate_books_per_page(value: u32) -> Result<u32, DomainError> {
    if (1..=MAX_BOOKS_PER_PAGE).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::validation(format!(
            "books_per_page must be between 1 and {MAX_BOOKS_PER_PAGE}, got {value}"
        )))
    }
}
