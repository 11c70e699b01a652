/// Background reclamation of blacklist entries
///
/// Runs on its own task, independent of request traffic. A failed pass is
/// logged and the loop carries on; entries still expire at the store level.
use crate::security::RevocationRegistry;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info};

/// Spawn the blacklist sweeper.
///
/// The first pass runs one `interval` after start. The task exits once the
/// shutdown channel carries `true` or its sender is dropped.
///
/// ## Returns
///
/// JoinHandle for background task
pub fn spawn_blacklist_sweeper(
    registry: RevocationRegistry,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        "Starting blacklist sweeper"
    );

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match registry.sweep_expired().await {
                        Ok(report) => info!(
                            scanned = report.scanned,
                            removed = report.removed,
                            failed = report.failed,
                            "Blacklist sweep completed"
                        ),
                        Err(err) => error!("Blacklist sweep failed: {}", err),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Blacklist sweeper stopped");
    })
}
