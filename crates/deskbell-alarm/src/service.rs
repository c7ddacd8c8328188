//! Alarm orchestrator — the consistency contract between the store
//! and the timers.
//!
//! The store is updated first on every path; timer registration and
//! cancellation follow as best-effort in-memory steps. A record left
//! pending by a failed registration is not an error state — it is the
//! reconciliation sweep's job.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use deskbell_core::error::{DeskbellError, Result};

use crate::model::{is_valid_phone, Alarm, AlarmRequest, DomainType};
use crate::store::AlarmStore;
use crate::timer::AlarmTimer;

/// Entry point for scheduling, cancelling, and querying alarms.
pub struct AlarmService {
    store: Arc<AlarmStore>,
    timer: Arc<AlarmTimer>,
}

impl AlarmService {
    pub fn new(store: Arc<AlarmStore>, timer: Arc<AlarmTimer>) -> Self {
        Self { store, timer }
    }

    /// Validate, persist, and arm one alarm. Returns the persisted id.
    ///
    /// Persistence and registration are deliberately not atomic: once
    /// the record exists, a registration refusal is logged and the
    /// record stays pending for the sweep. No rollback.
    pub fn schedule(&self, request: &AlarmRequest) -> Result<String> {
        if !request.is_valid() {
            return Err(DeskbellError::Validation(
                "recipient, target and title are required".into(),
            ));
        }
        if !request.is_future() {
            return Err(DeskbellError::Validation(
                "notice time must be in the future".into(),
            ));
        }
        if !is_valid_phone(&request.recipient) {
            return Err(DeskbellError::Validation(format!(
                "'{}' is not a valid mobile number",
                request.recipient
            )));
        }

        let alarm = self.store.insert(request)?;
        tracing::info!(
            "📅 Alarm {} registered: {} '{}' at {}",
            alarm.id,
            alarm.domain,
            alarm.title,
            alarm.notice_time.format("%Y-%m-%d %H:%M:%S")
        );

        if !self.timer.register_once(&alarm.id, alarm.notice_time) {
            tracing::warn!(
                "⚠️ Timer registration refused for alarm {}, sweep will deliver it",
                alarm.id
            );
        }
        Ok(alarm.id)
    }

    /// Cancel one alarm. Unknown ids are `NotFound`; cancelling an
    /// already-spent alarm is a no-op, not an error.
    pub fn cancel(&self, id: &str) -> Result<()> {
        let alarm = self
            .store
            .get(id)?
            .ok_or_else(|| DeskbellError::NotFound(format!("alarm {id}")))?;
        if !alarm.active {
            tracing::debug!("Alarm {id} already inactive, nothing to cancel");
            return Ok(());
        }

        self.store.deactivate(id)?;
        // The handle may be long gone (fired, or a restart dropped the
        // map). That is fine — the record is now inactive either way.
        self.timer.cancel(id);
        tracing::info!("🚫 Alarm {id} cancelled");
        Ok(())
    }

    /// Cancel every active alarm attached to one domain object.
    /// Per-record failures are logged and skipped; returns how many
    /// were actually cancelled.
    pub fn cancel_by_target(&self, target_id: &str, domain: DomainType) -> Result<usize> {
        let alarms = self.store.by_target(target_id, domain)?;
        if alarms.is_empty() {
            return Ok(0);
        }

        let total = alarms.len();
        let mut cancelled = 0;
        for alarm in alarms {
            match self.store.deactivate(&alarm.id) {
                Ok(true) => {
                    self.timer.cancel(&alarm.id);
                    cancelled += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("⚠️ Could not cancel alarm {}: {e}", alarm.id);
                }
            }
        }
        tracing::info!("🚫 Cancelled {cancelled} of {total} alarms for {domain} {target_id}");
        Ok(cancelled)
    }

    /// Fetch one alarm.
    pub fn get(&self, id: &str) -> Result<Alarm> {
        self.store
            .get(id)?
            .ok_or_else(|| DeskbellError::NotFound(format!("alarm {id}")))
    }

    /// Active alarms for one recipient.
    pub fn by_recipient(&self, recipient: &str) -> Result<Vec<Alarm>> {
        self.store.by_recipient(recipient)
    }

    /// Active alarms attached to one domain object.
    pub fn by_target(&self, target_id: &str, domain: DomainType) -> Result<Vec<Alarm>> {
        self.store.by_target(target_id, domain)
    }

    /// Active alarms still ahead of now, soonest first.
    pub fn active(&self) -> Result<Vec<Alarm>> {
        self.store.active_after(Utc::now())
    }

    /// Active alarms with notice time inside [start, end].
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Alarm>> {
        self.store.between(start, end)
    }

    /// Re-arm timers for every active future alarm. Called once at
    /// process start so a restart does not cost a sweep interval of
    /// latency; overdue records are the sweep's job regardless.
    pub fn restore(&self) -> Result<usize> {
        let upcoming = self.store.active_after(Utc::now())?;
        let mut restored = 0;
        for alarm in &upcoming {
            if self.timer.register_once(&alarm.id, alarm.notice_time) {
                restored += 1;
            }
        }
        if restored > 0 {
            tracing::info!("📅 Restored {restored} alarm timers from the store");
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use deskbell_notify::NoopNotifier;

    fn setup(
        name: &str,
        notifier: Arc<NoopNotifier>,
    ) -> (Arc<AlarmStore>, Arc<AlarmTimer>, AlarmService, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("deskbell-service-{name}"));
        std::fs::remove_dir_all(&dir).ok();
        let store = Arc::new(AlarmStore::open(&dir.join("alarms.db")).unwrap());
        let timer = Arc::new(AlarmTimer::new(Arc::clone(&store), notifier, 10));
        let service = AlarmService::new(Arc::clone(&store), Arc::clone(&timer));
        (store, timer, service, dir)
    }

    fn request(target: &str, offset: Duration) -> AlarmRequest {
        AlarmRequest::for_schedule(
            "010-1234-5678",
            target,
            "standup",
            Some("daily sync"),
            Utc::now() + offset,
        )
    }

    #[tokio::test]
    async fn test_schedule_persists_and_arms() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, timer, service, dir) = setup("schedule", Arc::clone(&notifier));

        let id = service.schedule(&request("sched-1", Duration::hours(1))).unwrap();
        let alarm = store.get(&id).unwrap().unwrap();
        assert!(alarm.active);
        assert_eq!(alarm.title, "standup");
        assert!(timer.is_scheduled(&id));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_schedule_rejects_bad_requests() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, _timer, service, dir) = setup("reject", Arc::clone(&notifier));

        // Past notice time.
        let err = service
            .schedule(&request("s-1", -Duration::minutes(1)))
            .unwrap_err();
        assert!(matches!(err, DeskbellError::Validation(_)));

        // Blank title.
        let mut req = request("s-1", Duration::hours(1));
        req.title = "  ".into();
        assert!(matches!(
            service.schedule(&req).unwrap_err(),
            DeskbellError::Validation(_)
        ));

        // Landline-shaped recipient.
        let mut req = request("s-1", Duration::hours(1));
        req.recipient = "02-555-0199".into();
        assert!(matches!(
            service.schedule(&req).unwrap_err(),
            DeskbellError::Validation(_)
        ));

        // Nothing was persisted.
        assert_eq!(store.count_active().unwrap(), 0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_cancel_unknown_is_not_found() {
        let notifier = Arc::new(NoopNotifier::new());
        let (_store, _timer, service, dir) = setup("cancel-missing", Arc::clone(&notifier));
        assert!(matches!(
            service.cancel("no-such-alarm").unwrap_err(),
            DeskbellError::NotFound(_)
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_cancel_twice_is_idempotent() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, timer, service, dir) = setup("cancel-twice", Arc::clone(&notifier));

        let id = service.schedule(&request("s-1", Duration::hours(1))).unwrap();
        service.cancel(&id).unwrap();
        assert!(!store.get(&id).unwrap().unwrap().active);
        assert!(!timer.is_scheduled(&id));

        // Second cancel: no-op, not an error.
        service.cancel(&id).unwrap();
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_standup_scenario_end_to_end() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, _timer, service, dir) = setup("standup", Arc::clone(&notifier));

        let id = service.schedule(&request("sched-1", Duration::seconds(2))).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "010-1234-5678");
        assert!(sent[0].1.contains("standup"));
        assert!(!store.get(&id).unwrap().unwrap().active);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_by_target_silences_both() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, timer, service, dir) = setup("bulk", Arc::clone(&notifier));

        let a = service.schedule(&request("club-7", Duration::seconds(5))).unwrap();
        let b = service.schedule(&request("club-7", Duration::seconds(10))).unwrap();
        let other = service.schedule(&request("club-8", Duration::hours(1))).unwrap();

        let cancelled = service
            .cancel_by_target("club-7", DomainType::Schedule)
            .unwrap();
        assert_eq!(cancelled, 2);
        assert!(!store.get(&a).unwrap().unwrap().active);
        assert!(!store.get(&b).unwrap().unwrap().active);
        assert!(!timer.is_scheduled(&a));
        assert!(!timer.is_scheduled(&b));
        assert!(store.get(&other).unwrap().unwrap().active);

        // Past both notice times: nothing may be delivered.
        tokio::time::sleep(std::time::Duration::from_secs(30)).await;
        assert_eq!(notifier.sent_count(), 0);

        // Unknown target cancels nothing.
        assert_eq!(
            service
                .cancel_by_target("club-99", DomainType::Schedule)
                .unwrap(),
            0
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_queries() {
        let notifier = Arc::new(NoopNotifier::new());
        let (_store, _timer, service, dir) = setup("queries", Arc::clone(&notifier));

        let id = service.schedule(&request("s-1", Duration::hours(1))).unwrap();
        service.schedule(&request("s-2", Duration::hours(2))).unwrap();

        assert_eq!(service.get(&id).unwrap().target_id, "s-1");
        assert!(matches!(
            service.get("missing").unwrap_err(),
            DeskbellError::NotFound(_)
        ));
        assert_eq!(service.by_recipient("010-1234-5678").unwrap().len(), 2);
        assert_eq!(
            service.by_target("s-1", DomainType::Schedule).unwrap().len(),
            1
        );
        assert_eq!(service.active().unwrap().len(), 2);
        assert_eq!(
            service
                .between(Utc::now(), Utc::now() + Duration::minutes(90))
                .unwrap()
                .len(),
            1
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_restore_rearms_only_future_alarms() {
        let notifier = Arc::new(NoopNotifier::new());
        let (store, dir) = {
            let dir = std::env::temp_dir().join("deskbell-service-restore");
            std::fs::remove_dir_all(&dir).ok();
            (Arc::new(AlarmStore::open(&dir.join("alarms.db")).unwrap()), dir)
        };

        // State left behind by a previous process.
        store.insert(&request("s-future-1", Duration::hours(1))).unwrap();
        store.insert(&request("s-future-2", Duration::hours(2))).unwrap();
        let overdue = store.insert(&request("s-overdue", -Duration::minutes(5))).unwrap();

        // Fresh process: new timer, empty handle map.
        let timer = Arc::new(AlarmTimer::new(
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn deskbell_core::Notifier>,
            10,
        ));
        let service = AlarmService::new(Arc::clone(&store), Arc::clone(&timer));

        assert_eq!(service.restore().unwrap(), 2);
        assert_eq!(timer.scheduled_count(), 2);
        assert!(!timer.is_scheduled(&overdue.id));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_restart_recovery_fires_exactly_once() {
        use crate::sweep::ReconcileSweeper;

        let notifier = Arc::new(NoopNotifier::new());
        let dir = std::env::temp_dir().join("deskbell-service-restart");
        std::fs::remove_dir_all(&dir).ok();
        let store = Arc::new(AlarmStore::open(&dir.join("alarms.db")).unwrap());

        // Scheduled an hour out by the previous process; by the time
        // the new process is up, the notice time has passed.
        let overdue = store.insert(&request("s-1", -Duration::minutes(10))).unwrap();

        let timer = Arc::new(AlarmTimer::new(
            Arc::clone(&store),
            Arc::clone(&notifier) as Arc<dyn deskbell_core::Notifier>,
            10,
        ));
        assert_eq!(timer.scheduled_count(), 0);

        let sweeper = ReconcileSweeper::new(Arc::clone(&store), Arc::clone(&timer));
        let stats = sweeper.run_once().await;
        assert_eq!(stats.delivered, 1);
        assert_eq!(notifier.sent_count(), 1);
        assert!(!store.get(&overdue.id).unwrap().unwrap().active);

        // Nothing left for the next interval.
        assert_eq!(sweeper.run_once().await.total(), 0);
        assert_eq!(notifier.sent_count(), 1);
        std::fs::remove_dir_all(&dir).ok();
    }
}
