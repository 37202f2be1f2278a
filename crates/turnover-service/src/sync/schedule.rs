//! Periodic sync of all listings in the background.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use turnover_db::db::DbProvider;

use super::SyncEngine;

/// Stops a running scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// ## Summary
    /// Signals the scheduler to stop and waits for it. A sync already running
    /// is allowed to finish.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            tracing::debug!("Scheduler already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Scheduler task ended abnormally");
        }
    }
}

/// ## Summary
/// Spawns a task running [`SyncEngine::sync_all`] every `interval`, the first
/// run one interval after start. Returns `None` when `interval` is zero.
#[must_use]
pub fn spawn(
    engine: Arc<SyncEngine>,
    db: Arc<dyn DbProvider>,
    interval: Duration,
) -> Option<SchedulerHandle> {
    if interval.is_zero() {
        tracing::info!("Scheduled sync disabled");
        return None;
    }

    let (shutdown, mut stop) = watch::channel(false);
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(interval_secs = interval.as_secs(), "Scheduled sync started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match engine.sync_all(db.as_ref()).await {
                        Ok(session) => tracing::debug!(session_id = %session.id, "Scheduled sync done"),
                        Err(e) => tracing::error!(error = %e, "Scheduled sync failed"),
                    }
                }
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Scheduled sync stopped");
    });

    Some(SchedulerHandle { shutdown, task })
}
