use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Round-robin cursor for requests that match no route
#[derive(Clone, Default)]
pub struct RoundRobin {
    index: Arc<AtomicUsize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next index in `0..len`; 0 when `len` is 0
    pub fn next(&self, len: usize) -> usize {
        self.index
            .fetch_add(1, Ordering::Relaxed)
            .checked_rem(len)
            .unwrap_or(0)
    }
}
