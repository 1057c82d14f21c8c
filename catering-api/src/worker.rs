use std::sync::Arc;

use catering_lifecycle::ExpirySweeper;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};

/// Runs the expiry sweep on a fixed cadence for the life of the process.
pub async fn start_expiry_worker(sweeper: Arc<ExpirySweeper>, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval_seconds = every.as_secs(), "Expiry worker started");

    loop {
        ticker.tick().await;
        match sweeper.sweep().await {
            Ok(report) => {
                if !report.store_failures.is_empty() || !report.failed_notifications().is_empty() {
                    warn!(
                        cancelled = report.cancelled_count(),
                        store_failures = report.store_failures.len(),
                        failed_notifications = report.failed_notifications().len(),
                        "Expiry sweep finished with failures"
                    );
                }
            }
            Err(e) => error!("Expiry sweep failed: {}", e),
        }
    }
}
