//! Periodic scheduler — fixed-interval driver for the monitor
//!
//! One background tokio task. Ticks never overlap: the next tick is not
//! started until the previous probe sweep completes, which caps worst-case
//! staleness at one interval plus one full sweep. Cancellation stops the
//! timer before the task releases its reference to the shared state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::MonitorService;

/// Run the health check loop until cancelled (call from `tokio::spawn`).
pub async fn run_scheduler(
    monitor: Arc<MonitorService>,
    interval: Duration,
    cancel_token: CancellationToken,
) {
    info!(
        interval_secs = interval.as_secs(),
        threshold = monitor.threshold(),
        probes = monitor.resource_keys().len(),
        "scheduler started"
    );

    let mut ticker = tokio::time::interval(interval);
    // A sweep that overruns the interval delays the next tick instead of
    // bursting to catch up.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!(ticks, "scheduler received shutdown signal");
                return;
            }
            _ = ticker.tick() => {
                ticks += 1;
                debug!(tick = ticks, "running health checks");
                monitor.run_tick().await;
            }
        }
    }
}
