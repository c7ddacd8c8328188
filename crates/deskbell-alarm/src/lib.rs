//! # Deskbell Alarm
//!
//! The alarm scheduling and delivery subsystem: accept a commitment to
//! notify a recipient at a future instant, hold it in SQLite across
//! restarts, fire it on time, and never fire it twice.
//!
//! ## Architecture
//! ```text
//! AlarmService (orchestrator)
//!   ├── schedule → validate → AlarmStore.insert → AlarmTimer.register_once
//!   ├── cancel   → AlarmStore.deactivate + AlarmTimer.cancel
//!   └── queries  → AlarmStore (pure reads)
//!
//! AlarmTimer (in-memory, worker pool)
//!   └── sleep(delay) → claim handle → fire: load record → Notifier.deliver
//!                                            → mark inactive (always)
//!
//! Sweepers (periodic, store-driven)
//!   ├── ReconcileSweeper: overdue active records → fire → batch deactivate
//!   └── RetentionSweeper: week-old active records → age out, no delivery
//! ```
//!
//! The store is the source of truth; the timer map is a latency
//! optimization. Everything still fires (within one sweep interval)
//! with an empty map, which is exactly the restart story.

pub mod model;
pub mod service;
pub mod store;
pub mod sweep;
pub mod timer;

pub use model::{Alarm, AlarmRequest, DomainType};
pub use service::AlarmService;
pub use store::AlarmStore;
pub use sweep::{ReconcileSweeper, RetentionSweeper, SweepStats};
pub use timer::AlarmTimer;
