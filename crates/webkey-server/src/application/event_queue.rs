//! Event Queue: the buffer between transport handlers and the dispatcher.
//!
//! Any number of producers [`push`](EventQueue::push) under a short mutex;
//! the single dispatcher takes everything at once with
//! [`drain_all`](EventQueue::drain_all), which swaps the buffer out instead
//! of popping items one by one.
//!
//! The queue is bounded.  An event that arrives while `max_pending` events
//! are waiting is refused and counted as dropped; the producer learns this
//! from the returned [`EnqueueError`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use webkey_core::InputEvent;

/// Default bound on waiting events.
pub const DEFAULT_MAX_PENDING: usize = 4096;

/// Error returned when the queue refuses an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnqueueError {
    #[error("event queue is full ({capacity} pending)")]
    Full { capacity: usize },
}

/// Counters since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub enqueued: u64,
    pub dropped: u64,
}

/// FIFO buffer of validated input events.
pub struct EventQueue {
    pending: Mutex<Vec<InputEvent>>,
    max_pending: usize,
    enqueued: AtomicU64,
    dropped: AtomicU64,
}

impl EventQueue {
    /// Creates a queue holding at most `max_pending` events (at least one).
    pub fn new(max_pending: usize) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            max_pending: max_pending.max(1),
            enqueued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<InputEvent>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `event` behind everything already waiting.
    ///
    /// # Errors
    ///
    /// [`EnqueueError::Full`] when `max_pending` events are already waiting.
    pub fn push(&self, event: InputEvent) -> Result<(), EnqueueError> {
        let mut pending = self.lock();
        if pending.len() >= self.max_pending {
            drop(pending);
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(EnqueueError::Full {
                capacity: self.max_pending,
            });
        }
        pending.push(event);
        drop(pending);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Takes every waiting event in arrival order, leaving the queue empty.
    pub fn drain_all(&self) -> Vec<InputEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_pending
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
