//! Bounded concurrency for open crawl sessions
//!
//! One permit per live browser/HTTP session. The permit is RAII so release
//! happens exactly once on every exit path: normal completion, error, and
//! the fallback transition all go through the same drop.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Bounds the number of simultaneously open crawl sessions
#[derive(Debug, Clone)]
pub struct SessionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Held slot in the gate; the slot frees when this drops
#[derive(Debug)]
pub struct SessionPermit {
    _permit: OwnedSemaphorePermit,
}

impl SessionGate {
    /// Create a gate admitting at most `capacity` concurrent sessions
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Configured capacity
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Suspend until a slot is free, then reserve it.
    ///
    /// The semaphore is never closed, so acquisition only fails if the gate
    /// is torn down mid-wait, which cannot happen while a caller holds a
    /// clone of it.
    pub async fn acquire(&self) -> SessionPermit {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("session gate semaphore is never closed"));
        SessionPermit { _permit: permit }
    }
}
