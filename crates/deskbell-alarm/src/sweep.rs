//! Periodic sweeps over the alarm store.
//!
//! The reconciliation sweep is the durability guarantee: every pending
//! alarm whose notice time has passed gets fired within one sweep
//! interval, no matter what happened to the in-memory timers. The
//! retention sweep bounds how far back that scan can reach by aging
//! out week-old leftovers instead of firing them.

use std::sync::Arc;

use chrono::{Duration, Utc};

use crate::store::AlarmStore;
use crate::timer::{AlarmTimer, FireOutcome};

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub delivered: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SweepStats {
    pub fn total(&self) -> usize {
        self.delivered + self.failed + self.skipped
    }
}

/// Fires overdue alarms the timers missed (restart, refused
/// registration, lost handle).
pub struct ReconcileSweeper {
    store: Arc<AlarmStore>,
    timer: Arc<AlarmTimer>,
}

impl ReconcileSweeper {
    pub fn new(store: Arc<AlarmStore>, timer: Arc<AlarmTimer>) -> Self {
        Self { store, timer }
    }

    /// One pass: fire every overdue active alarm, oldest first, then
    /// batch-settle the processed ids. Per-record failures are counted
    /// and never stop the pass. A quiet system produces no log output.
    pub async fn run_once(&self) -> SweepStats {
        let mut stats = SweepStats::default();
        let due = match self.store.due(Utc::now()) {
            Ok(due) => due,
            Err(e) => {
                tracing::error!("🧹 Sweep query failed: {e}");
                return stats;
            }
        };
        if due.is_empty() {
            return stats;
        }

        let mut processed = Vec::new();
        for alarm in due {
            // A live handle means the timer claimed this instant as its
            // own and is waking right now; double delivery is worse
            // than waiting one more interval.
            if self.timer.is_scheduled(&alarm.id) {
                stats.skipped += 1;
                continue;
            }
            match self.timer.fire(&alarm.id).await {
                FireOutcome::Delivered => {
                    stats.delivered += 1;
                    processed.push(alarm.id);
                }
                FireOutcome::Failed => {
                    stats.failed += 1;
                    processed.push(alarm.id);
                }
                FireOutcome::Skipped => stats.skipped += 1,
            }
        }

        // The firing path already marks each record inactive; this
        // batch settles any record where that single update failed.
        if let Err(e) = self.store.deactivate_many(&processed) {
            tracing::error!("🧹 Sweep batch settle failed: {e}");
        }

        tracing::info!(
            "🧹 Sweep done: {} delivered, {} failed, {} skipped",
            stats.delivered,
            stats.failed,
            stats.skipped
        );
        stats
    }
}

/// Ages out active alarms whose notice time is long past, treating
/// them as abandoned rather than re-firing stale reminders.
pub struct RetentionSweeper {
    store: Arc<AlarmStore>,
    retention: Duration,
}

impl RetentionSweeper {
    pub fn new(store: Arc<AlarmStore>, retention_days: i64) -> Self {
        Self {
            store,
            retention: Duration::days(retention_days),
        }
    }

    /// One pass: deactivate (never delete, never notify) everything
    /// older than the retention window. Returns the aged-out count.
    pub fn run_once(&self) -> usize {
        let cutoff = Utc::now() - self.retention;
        match self.store.deactivate_older_than(cutoff) {
            Ok(0) => 0,
            Ok(aged) => {
                tracing::info!("🗑️ Retention: {aged} stale alarms aged out");
                aged
            }
            Err(e) => {
                tracing::error!("🗑️ Retention sweep failed: {e}");
                0
            }
        }
    }
}

/// Spawnable reconciliation loop.
pub async fn run_reconcile_loop(sweeper: Arc<ReconcileSweeper>, interval_secs: u64) {
    tracing::info!("🧹 Reconciliation sweep started (every {interval_secs}s)");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        sweeper.run_once().await;
    }
}

/// Spawnable retention loop.
pub async fn run_retention_loop(sweeper: Arc<RetentionSweeper>, interval_secs: u64) {
    tracing::info!("🗑️ Retention sweep started (every {interval_secs}s)");
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        sweeper.run_once();
    }
}
