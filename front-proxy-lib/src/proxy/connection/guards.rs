use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::telemetry::Metrics;

/// Tracks connections being served so shutdown can wait for them
#[derive(Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    closed: Arc<Notify>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Register a new connection; it counts as active until the guard drops
    pub fn track(&self, metrics: Option<Arc<Metrics>>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::AcqRel);
        if let Some(ref m) = metrics {
            m.record_connection_opened();
        }
        ConnectionGuard { tracker: self.clone(), metrics }
    }

    /// Wait until no connection is active
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.closed.notified();
            if self.active() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Guard to decrement the active connections counter when dropped
/// Also wakes shutdown when the last connection closes
pub struct ConnectionGuard {
    tracker: ConnectionTracker,
    metrics: Option<Arc<Metrics>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let remaining = self.tracker.active.fetch_sub(1, Ordering::AcqRel);
        if let Some(ref m) = self.metrics {
            m.record_connection_closed();
        }
        if remaining == 1 {
            self.tracker.closed.notify_waiters();
        }
    }
}
