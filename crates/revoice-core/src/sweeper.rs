//! Periodic cleanup of expired task records and their artifacts.
//!
//! A single long-lived task snapshots the store on a fixed interval and
//! removes every terminal record older than the retention window, together
//! with its working directory.  Tasks that are still `Pending` or
//! `Processing` are skipped so a slow conversion is never deleted out from
//! under its running worker.  Runs until the cancellation token fires.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::orchestrator::{remove_dir_best_effort, task_work_dir};
use crate::store::TaskStore;

/// Default time between sweep passes: one hour.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Default record retention: 24 hours.
pub const DEFAULT_RETENTION_HOURS: i64 = 24;

/// Counters for one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub examined: usize,
    pub removed: usize,
}

/// One sweep pass over a point-in-time snapshot of the store.
///
/// Eligibility: terminal status and `now - created_at > retention`.  Artifact
/// removal is best-effort and one record's failure never stops the sweep of
/// the rest.  Records already removed by an explicit delete are treated as
/// already swept.  Idempotent: a second pass over the same state removes
/// nothing.
pub async fn sweep_once(
    store: &TaskStore,
    work_root: &Path,
    retention: chrono::Duration,
    now: DateTime<Utc>,
) -> SweepStats {
    let records = store.snapshot().await;
    let mut stats = SweepStats {
        examined: records.len(),
        ..SweepStats::default()
    };

    for record in records {
        if !record.status.is_terminal() {
            // A worker may still be running; leave it alone.
            continue;
        }
        if now - record.created_at <= retention {
            continue;
        }

        remove_dir_best_effort(&task_work_dir(work_root, record.id)).await;
        if store.remove(record.id).await.is_some() {
            info!(task_id = %record.id, "expired task swept");
            stats.removed += 1;
        }
    }

    stats
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    store: TaskStore,
    work_root: PathBuf,
    interval: Duration,
    retention: chrono::Duration,
    cancel: CancellationToken,
) {
    info!(
        interval_secs = interval.as_secs(),
        retention_hours = retention.num_hours(),
        "expiry sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("expiry sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                let stats = sweep_once(&store, &work_root, retention, Utc::now()).await;
                if stats.removed > 0 {
                    info!(examined = stats.examined, removed = stats.removed, "sweep pass finished");
                } else {
                    debug!(examined = stats.examined, "sweep pass found nothing to remove");
                }
            }
        }
    }
}
