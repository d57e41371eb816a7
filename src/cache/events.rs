//! Book mutation events.

use std::sync::atomic::{AtomicU64, Ordering};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::books::BookId;

/// Monotonic sequence number assigned to each published event.
pub type Epoch = u64;

#[derive(Debug, Clone)]
pub struct BookEvent {
    /// Unique identifier, carried into logs for correlation.
    pub id: Uuid,
    pub epoch: Epoch,
    pub kind: EventKind,
    pub timestamp: OffsetDateTime,
}

impl BookEvent {
    pub fn new(kind: EventKind, epoch: Epoch) -> Self {
        Self {
            id: Uuid::new_v4(),
            epoch,
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// What happened to a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A book was created or updated.
    BookSaved { book_id: BookId },
    /// A book was deleted.
    BookDeleted { book_id: BookId },
}

impl EventKind {
    pub fn book_id(self) -> BookId {
        match self {
            Self::BookSaved { book_id } | Self::BookDeleted { book_id } => book_id,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct EpochCounter(AtomicU64);

impl EpochCounter {
    pub(crate) fn next(&self) -> Epoch {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}
