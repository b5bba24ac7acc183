use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::IdentityLimiterRegistry;
use crate::telemetry::Metrics;

/// Spawn a background task that periodically evicts idle identities.
///
/// The task runs until `shutdown` is cancelled.
pub fn spawn_sweeper(
    registry: Arc<IdentityLimiterRegistry>,
    every: Duration,
    max_idle: Duration,
    metrics: Option<Arc<Metrics>>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    debug!("Rate limit sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = registry.evict_stale(max_idle);
                    let tracked = registry.len();
                    if removed > 0 {
                        info!(removed, tracked, "Evicted idle rate limiters");
                    }
                    if let Some(ref m) = metrics {
                        m.record_rate_limit_evictions(removed as u64);
                        m.record_tracked_identities(tracked as u64);
                    }
                }
            }
        }
    })
}
