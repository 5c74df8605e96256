//! Single-slot mailbox for audio-thread to control-thread notification.
//!
//! The producer must never block for long or allocate; the consumer
//! drains on its own cadence. A mutex-guarded `Option` slot gives both:
//! posting is a store under a lock whose only other critical section is a
//! swap, and a slow consumer loses intermediate values rather than
//! queueing them; only the latest state matters for display.

use parking_lot::Mutex;

/// Mutex-guarded optional-value slot with last-write-wins semantics.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Mailbox::new()
    }
}

impl<T> Mailbox<T> {
    /// Create an empty mailbox.
    pub fn new() -> Mailbox<T> {
        Mailbox {
            slot: Mutex::new(None),
        }
    }

    /// Post a value, overwriting any undrained one.
    ///
    /// Returns `true` if an undrained value was replaced.
    pub fn post(&self, value: T) -> bool {
        self.slot.lock().replace(value).is_some()
    }

    /// Drain the slot.
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }
}
