//! Concurrency gate
//!
//! Bounds how many page and leaf fetches are in flight at once. Both stages
//! of a batch go through the same gate.

use super::cancel::CancellationToken;
use std::sync::Arc;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Fixed-capacity admission gate
///
/// A slot is held for as long as the returned permit lives, so it is
/// released on every exit path of the guarded work.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    /// Create a gate with the given number of slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Wait for a slot
    ///
    /// Returns `None` without taking a slot when cancellation is requested
    /// before or while waiting.
    pub async fn enter(&self, cancel: &CancellationToken) -> Option<SemaphorePermit<'_>> {
        if cancel.is_cancelled() {
            return None;
        }

        let permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return None,
            permit = self.semaphore.acquire() => permit.ok()?,
        };

        if cancel.is_cancelled() {
            return None;
        }
        Some(permit)
    }
}

#[cfg(test)]
mod gate_tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_gate_capacity_at_least_one() {
        assert_eq!(ConcurrencyGate::new(0).capacity(), 1);
        assert_eq!(ConcurrencyGate::new(4).capacity(), 4);
    }

    #[tokio::test]
    async fn test_gate_releases_on_drop() {
        let gate = ConcurrencyGate::new(2);
        let cancel = CancellationToken::new();

        {
            let _a = gate.enter(&cancel).await.unwrap();
            let _b = gate.enter(&cancel).await.unwrap();
            assert_eq!(gate.available(), 0);
        }

        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_gate_refuses_when_cancelled() {
        let gate = ConcurrencyGate::new(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(gate.enter(&cancel).await.is_none());
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_gate_waiter_released_by_cancel() {
        let gate = ConcurrencyGate::new(1);
        let cancel = CancellationToken::new();
        let _held = gate.enter(&cancel).await.unwrap();

        let waiter = gate.enter(&cancel);
        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel.cancel();
        };

        let (admitted, ()) = tokio::join!(waiter, canceller);
        assert!(admitted.is_none());
    }
}
