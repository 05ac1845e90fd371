//! Periodic removal of old finished jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use jobtrack_registry::JobRegistry;

/// Spawn a task that calls [`JobRegistry::cleanup`] every `interval`.
///
/// Returns `None` when `interval` is zero.
pub fn spawn_cleanup_task(
    registry: Arc<JobRegistry>,
    interval: Duration,
    retention: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        info!("Periodic job cleanup disabled");
        return None;
    }

    info!(
        interval_secs = interval.as_secs(),
        retention_secs = retention.as_secs(),
        "Starting periodic job cleanup"
    );

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = registry.cleanup(retention);
            if removed > 0 {
                info!(removed, remaining = registry.len(), "Removed expired jobs");
            } else {
                debug!("No expired jobs");
            }
        }
    }))
}
