//! Rotation cursor for tie-breaking between equally loaded nodes.
//!
//! Each attempt owns one cursor. Every ranking pass takes the next
//! value and rotates each group of equally ranked nodes by it, so
//! repeated asks spread across ties instead of always landing on the
//! same node. Selection order stays deterministic for a given cursor
//! position, which keeps placement reproducible in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct RotationCursor {
    counter: AtomicUsize,
}

impl RotationCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the current position and advance by one.
    pub fn advance(&self) -> usize {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}
