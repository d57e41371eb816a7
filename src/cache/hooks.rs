//! Explicit registry of book mutation listeners.
//!
//! Write paths publish through [`MutationHooks`] after a successful write;
//! every registered listener runs before the publishing call returns.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::books::BookId;

use super::events::{BookEvent, EpochCounter, EventKind};
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::hooks";

#[derive(Debug, Error)]
#[error("mutation listener `{listener}` failed: {message}")]
pub struct HookError {
    pub listener: &'static str,
    pub message: String,
}

#[async_trait]
pub trait MutationListener: Send + Sync {
    /// Stable name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn on_mutation(&self, event: &BookEvent) -> Result<(), HookError>;
}

#[derive(Default)]
pub struct MutationHooks {
    listeners: RwLock<Vec<Arc<dyn MutationListener>>>,
    epochs: EpochCounter,
}

impl MutationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Arc<dyn MutationListener>) {
        info!(listener = listener.name(), "Mutation listener registered");
        rw_write(&self.listeners, SOURCE, "register").push(listener);
    }

    pub fn listener_count(&self) -> usize {
        rw_read(&self.listeners, SOURCE, "listener_count").len()
    }

    /// Deliver an event to every listener, in registration order.
    ///
    /// All listeners run even when one fails; the first failure is returned.
    pub async fn publish(&self, kind: EventKind) -> Result<(), HookError> {
        let event = BookEvent::new(kind, self.epochs.next());
        let listeners = rw_read(&self.listeners, SOURCE, "publish").clone();

        info!(
            event_id = %event.id,
            event_epoch = event.epoch,
            event_kind = ?event.kind,
            event_at = %event.timestamp,
            book_id = event.kind.book_id(),
            listeners = listeners.len(),
            "Book mutation published"
        );

        let mut first_error = None;
        for listener in listeners {
            if let Err(err) = listener.on_mutation(&event).await {
                warn!(
                    event_id = %event.id,
                    listener = listener.name(),
                    error = %err,
                    "Mutation listener failed"
                );
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub async fn book_saved(&self, book_id: BookId) -> Result<(), HookError> {
        self.publish(EventKind::BookSaved { book_id }).await
    }

    pub async fn book_deleted(&self, book_id: BookId) -> Result<(), HookError> {
        self.publish(EventKind::BookDeleted { book_id }).await
    }
}
