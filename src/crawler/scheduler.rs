//! Task slot pool bounding concurrent analyses
//!
//! Every analysis task must hold a slot for its whole lifetime. The pool is
//! owned by the [`Engine`](crate::crawler::Engine) and shared by every batch
//! it runs, so the bound is global rather than per batch.

use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A held task slot; the slot is released when this is dropped
#[derive(Debug)]
pub struct TaskSlot {
    _permit: OwnedSemaphorePermit,
}

/// Fixed-size pool of task slots
#[derive(Debug, Clone)]
pub struct TaskSlots {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl TaskSlots {
    /// Creates a pool with `capacity` slots (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Waits for a free slot
    ///
    /// Returns None only if the underlying semaphore has been closed.
    pub async fn acquire(&self) -> Option<TaskSlot> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;
        Some(TaskSlot { _permit: permit })
    }

    /// Takes a slot if one is free right now
    pub fn try_acquire(&self) -> Option<TaskSlot> {
        let permit = self.semaphore.clone().try_acquire_owned().ok()?;
        Some(TaskSlot { _permit: permit })
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_new_pool() {
        let slots = TaskSlots::new(3);
        assert_eq!(slots.capacity(), 3);
        assert_eq!(slots.available(), 3);
        assert_eq!(slots.in_use(), 0);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let slots = TaskSlots::new(0);
        assert_eq!(slots.capacity(), 1);
    }

    #[test]
    fn test_slot_released_on_drop() {
        let slots = TaskSlots::new(1);

        let slot = slots.try_acquire();
        assert!(slot.is_some());
        assert!(slots.try_acquire().is_none());
        assert_eq!(slots.in_use(), 1);

        drop(slot);
        assert_eq!(slots.available(), 1);
        assert!(slots.try_acquire().is_some());
    }

    #[test]
    fn test_clones_share_slots() {
        let slots = TaskSlots::new(2);
        let other = slots.clone();

        let _held = slots.try_acquire();
        assert_eq!(other.available(), 1);
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let slots = TaskSlots::new(1);
        let held = slots.acquire().await.unwrap();

        let waiter = {
            let slots = slots.clone();
            tokio::spawn(async move { slots.acquire().await.is_some() })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(held);
        assert!(waiter.await.unwrap());
    }
}
