//! Cache key definitions.

/// Keys written to the cache store.
///
/// The book list is a single global entry; it is not parameterized per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    BookList,
}

impl CacheKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookList => "books:all",
        }
    }
}
