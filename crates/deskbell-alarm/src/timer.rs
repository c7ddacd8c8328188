//! In-memory timer scheduler — one cancellable deferred task per
//! registered alarm, executed on a bounded worker pool.
//!
//! The handle map is a latency optimization over the store, never the
//! source of truth: a lost or refused registration just means the
//! reconciliation sweep delivers that alarm instead.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use deskbell_core::traits::Notifier;

use crate::store::AlarmStore;

/// What happened when an alarm was driven through the firing path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// Transport accepted the message.
    Delivered,
    /// Transport rejected the message; the alarm is still spent.
    Failed,
    /// No live record to fire (unknown id, or already inactive).
    Skipped,
}

struct ScheduledHandle {
    task: JoinHandle<()>,
    /// Wall-clock delay computed at registration time.
    delay: Duration,
}

/// One-shot alarm timers. Construct once, share via `Arc`.
pub struct AlarmTimer {
    handles: Arc<RwLock<HashMap<String, ScheduledHandle>>>,
    workers: Arc<Semaphore>,
    store: Arc<AlarmStore>,
    notifier: Arc<dyn Notifier>,
}

impl AlarmTimer {
    pub fn new(store: Arc<AlarmStore>, notifier: Arc<dyn Notifier>, workers: usize) -> Self {
        Self {
            handles: Arc::new(RwLock::new(HashMap::new())),
            workers: Arc::new(Semaphore::new(workers)),
            store,
            notifier,
        }
    }

    /// Register a one-shot firing for `id` at `fire_at`.
    ///
    /// Refuses (returns false) when the instant has already passed —
    /// the reconciliation sweep picks such alarms up immediately.
    /// Re-registering a live id cancels the previous handle
    /// (last-writer-wins).
    pub fn register_once(&self, id: &str, fire_at: DateTime<Utc>) -> bool {
        let delay = fire_at - Utc::now();
        if delay <= TimeDelta::zero() {
            tracing::warn!("⏰ Notice time already passed for alarm {id}, leaving it to the sweep");
            return false;
        }
        let delay = delay.to_std().unwrap_or(Duration::ZERO);

        let handles = Arc::clone(&self.handles);
        let workers = Arc::clone(&self.workers);
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let task_id = id.to_string();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Claim the handle. Losing the claim means a cancel (or a
            // replacement registration) got there first.
            let claimed = handles.write().unwrap().remove(&task_id).is_some();
            if !claimed {
                return;
            }
            let _permit = match workers.acquire().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            fire_alarm(&store, notifier.as_ref(), &task_id).await;
        });

        let old = self.handles.write().unwrap().insert(
            id.to_string(),
            ScheduledHandle { task, delay },
        );
        if let Some(old) = old {
            old.task.abort();
            tracing::warn!("⏰ Replaced live timer for alarm {id}");
        }
        tracing::info!("📅 Alarm {id} scheduled, fires in {}s", delay.as_secs());
        true
    }

    /// Cancel the handle for `id` if one is live. Best-effort and
    /// non-preemptive: a firing that already claimed its handle runs
    /// to completion. The return value is purely informational.
    pub fn cancel(&self, id: &str) -> bool {
        match self.handles.write().unwrap().remove(id) {
            Some(handle) => {
                handle.task.abort();
                tracing::info!("🚫 Timer cancelled for alarm {id}");
                true
            }
            None => {
                tracing::debug!("No live timer for alarm {id} (fired, cancelled, or never registered)");
                false
            }
        }
    }

    /// Drive the firing path for `id` directly. Used by the deferred
    /// tasks and by the reconciliation sweep.
    pub async fn fire(&self, id: &str) -> FireOutcome {
        fire_alarm(&self.store, self.notifier.as_ref(), id).await
    }

    /// Number of live handles.
    pub fn scheduled_count(&self) -> usize {
        self.handles.read().unwrap().len()
    }

    pub fn is_scheduled(&self, id: &str) -> bool {
        self.handles.read().unwrap().contains_key(id)
    }

    /// The wall-clock delay recorded when `id` was registered.
    pub fn scheduled_delay(&self, id: &str) -> Option<Duration> {
        self.handles.read().unwrap().get(id).map(|h| h.delay)
    }

    /// Abort every live handle. Process shutdown path.
    pub fn shutdown(&self) {
        let drained: Vec<(String, ScheduledHandle)> =
            self.handles.write().unwrap().drain().collect();
        let count = drained.len();
        for (_, handle) in drained {
            handle.task.abort();
        }
        if count > 0 {
            tracing::info!("⏰ Timer shut down, {count} pending handles aborted");
        }
    }
}

/// Load the authoritative record, deliver, and spend the alarm.
///
/// The persisted record wins over whatever the registering caller knew:
/// a cancellation that landed between registration and wake-up shows up
/// here as an inactive record. Delivery is single-attempt; success or
/// failure, the record is marked inactive — an alarm never re-arms.
/// Nothing propagates: one alarm's failure must not reach the pool.
async fn fire_alarm(store: &AlarmStore, notifier: &dyn Notifier, id: &str) -> FireOutcome {
    let alarm = match store.get(id) {
        Ok(Some(alarm)) => alarm,
        Ok(None) => {
            tracing::warn!("🔔 Alarm {id} not found at fire time, skipping");
            return FireOutcome::Skipped;
        }
        Err(e) => {
            tracing::error!("🔔 Alarm {id} lookup failed at fire time: {e}");
            return FireOutcome::Skipped;
        }
    };
    if !alarm.active {
        tracing::debug!("🔔 Alarm {id} already inactive, skipping");
        return FireOutcome::Skipped;
    }

    let message = alarm.message();
    let outcome = match notifier.deliver(&alarm.recipient, &message).await {
        Ok(()) => {
            tracing::info!("✅ Alarm {id} delivered ({} '{}')", alarm.domain, alarm.title);
            FireOutcome::Delivered
        }
        Err(e) => {
            tracing::warn!("⚠️ Alarm {id} delivery failed, not re-arming: {e}");
            FireOutcome::Failed
        }
    };

    if let Err(e) = store.deactivate(id) {
        tracing::error!("🔔 Could not mark alarm {id} inactive: {e}");
    }
    outcome
}
