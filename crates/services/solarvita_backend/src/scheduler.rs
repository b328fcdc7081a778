// --- File: crates/services/solarvita_backend/src/scheduler.rs ---
use solarvita_notifications::RetentionSweeper;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info};

/// Runs a retention sweep every `every`, starting one period after launch.
///
/// A failed sweep is logged; the next tick sweeps again.
pub fn spawn_retention_sweeps(sweeper: Arc<RetentionSweeper>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        info!(every_secs = every.as_secs(), "Retention sweeps scheduled");
        loop {
            ticker.tick().await;
            match sweeper.sweep().await {
                Ok(report) => info!(deleted = report.deleted, "Scheduled retention sweep done"),
                Err(err) => error!(error = %err, "Scheduled retention sweep failed"),
            }
        }
    })
}

pub fn sweep_interval(hours: u64) -> Duration {
    Duration::from_secs(hours.max(1) * 60 * 60)
}
