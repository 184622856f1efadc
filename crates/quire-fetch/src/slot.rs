//! Last-request-wins cancellation.
//!
//! Each fetch kind (main page, navbar, sidebar, cover) owns a [`FetchSlot`].
//! Starting a request takes a [`Ticket`] and aborts every earlier ticket of
//! the same slot; a completion holding a stale ticket is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::fetch::FetchError;

/// Generation counter shared by the requests of one fetch kind.
#[derive(Debug, Clone, Default)]
pub struct FetchSlot {
    generation: Arc<AtomicU64>,
}

/// Handle of one in-flight request.
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: Arc<AtomicU64>,
    issued: u64,
}

impl FetchSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding any previous one.
    #[must_use]
    pub fn begin(&self) -> Ticket {
        let issued = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            generation: Arc::clone(&self.generation),
            issued,
        }
    }

    /// Abort the in-flight request without starting a new one.
    pub fn abort(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}

impl Ticket {
    /// Whether no newer request has started on the slot.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.issued
    }

    /// Pass a completion through, or turn it into an abort when stale.
    ///
    /// # Errors
    ///
    /// Returns the original error, or an aborted [`FetchError`] when the
    /// ticket was superseded.
    pub fn complete<T>(&self, result: Result<T, FetchError>) -> Result<T, FetchError> {
        if self.is_current() {
            result
        } else {
            tracing::debug!(ticket = self.issued, "Dropping stale completion");
            Err(FetchError::aborted())
        }
    }
}
