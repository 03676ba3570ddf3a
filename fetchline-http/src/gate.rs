use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::FetchError;

/// Counting semaphore that caps in-flight fetches.
///
/// A permit is released when the returned [`GatePermit`] drops, so every exit
/// path of the holder (return, `?`, panic, cancellation) gives it back once.
/// Waiters are not guaranteed to be admitted in arrival order.
#[derive(Clone, Debug)]
pub struct ConcurrencyGate {
    permits: Arc<Semaphore>,
    capacity: usize,
}

/// RAII permit from a [`ConcurrencyGate`].
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free permit. Fails only if the semaphore was closed.
    pub async fn acquire(&self) -> Result<GatePermit, FetchError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| FetchError::Task(format!("concurrency gate: {e}")))?;
        Ok(GatePermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}
