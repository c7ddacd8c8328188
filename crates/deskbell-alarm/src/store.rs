//! SQLite-backed alarm store — the single source of truth for
//! active/inactive state. Survives restarts; the in-memory timer map
//! is rebuilt from here.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;

use deskbell_core::error::{DeskbellError, Result};

use crate::model::{Alarm, AlarmRequest, DomainType};

const COLUMNS: &str =
    "id, recipient, target_id, domain_type, title, description, notice_time, active, created_at, updated_at";

/// Persisted alarm records.
pub struct AlarmStore {
    conn: Mutex<Connection>,
}

impl AlarmStore {
    /// Open or create the alarm database.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .map_err(|e| DeskbellError::Store(format!("DB open: {e}")))?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<()> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS alarms (
                    id TEXT PRIMARY KEY,
                    recipient TEXT NOT NULL,
                    target_id TEXT NOT NULL,
                    domain_type TEXT NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT,
                    notice_time TEXT NOT NULL,
                    active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_alarms_due
                    ON alarms (active, notice_time);
                CREATE INDEX IF NOT EXISTS idx_alarms_target
                    ON alarms (target_id, domain_type, active);",
            )
            .map_err(|e| DeskbellError::Store(format!("Migration: {e}")))?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DeskbellError::Store(format!("connection lock: {e}")))
    }

    /// Persist a new alarm as active. The store owns id generation and
    /// both timestamps; callers get the full record back.
    pub fn insert(&self, request: &AlarmRequest) -> Result<Alarm> {
        let now = Utc::now();
        let alarm = Alarm {
            id: uuid::Uuid::new_v4().to_string(),
            recipient: request.recipient.clone(),
            target_id: request.target_id.clone(),
            domain: request.domain,
            title: request.title.clone(),
            description: request.description.clone(),
            notice_time: request.notice_time,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.conn()?
            .execute(
                "INSERT INTO alarms (id, recipient, target_id, domain_type, title, description,
                                     notice_time, active, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    alarm.id,
                    alarm.recipient,
                    alarm.target_id,
                    alarm.domain.label(),
                    alarm.title,
                    alarm.description,
                    ts(alarm.notice_time),
                    alarm.active as i32,
                    ts(alarm.created_at),
                    ts(alarm.updated_at),
                ],
            )
            .map_err(|e| DeskbellError::Store(format!("Insert alarm: {e}")))?;
        Ok(alarm)
    }

    /// Fetch one alarm by id.
    pub fn get(&self, id: &str) -> Result<Option<Alarm>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM alarms WHERE id = ?1"))
            .map_err(|e| DeskbellError::Store(format!("Get alarm: {e}")))?;
        match stmt.query_row([id], row_to_alarm) {
            Ok(alarm) => Ok(Some(alarm)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DeskbellError::Store(format!("Get alarm: {e}"))),
        }
    }

    /// Active alarms for one recipient.
    pub fn by_recipient(&self, recipient: &str) -> Result<Vec<Alarm>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM alarms
                 WHERE recipient = ?1 AND active = 1 ORDER BY notice_time"
            ),
            rusqlite::params![recipient],
        )
    }

    /// Active alarms attached to one domain object.
    pub fn by_target(&self, target_id: &str, domain: DomainType) -> Result<Vec<Alarm>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM alarms
                 WHERE target_id = ?1 AND domain_type = ?2 AND active = 1 ORDER BY notice_time"
            ),
            rusqlite::params![target_id, domain.label()],
        )
    }

    /// Active alarms with notice time inside [start, end].
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Alarm>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM alarms
                 WHERE notice_time BETWEEN ?1 AND ?2 AND active = 1 ORDER BY notice_time"
            ),
            rusqlite::params![ts(start), ts(end)],
        )
    }

    /// Active alarms still ahead of `now`, soonest first. Used to
    /// rebuild timers after a restart.
    pub fn active_after(&self, now: DateTime<Utc>) -> Result<Vec<Alarm>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM alarms
                 WHERE notice_time >= ?1 AND active = 1 ORDER BY notice_time"
            ),
            rusqlite::params![ts(now)],
        )
    }

    /// Active alarms whose notice time has arrived, oldest first so a
    /// backlog drains in fairness order.
    pub fn due(&self, now: DateTime<Utc>) -> Result<Vec<Alarm>> {
        self.query(
            &format!(
                "SELECT {COLUMNS} FROM alarms
                 WHERE notice_time <= ?1 AND active = 1 ORDER BY notice_time"
            ),
            rusqlite::params![ts(now)],
        )
    }

    /// Mark one alarm inactive. Returns whether a row changed (false
    /// for unknown ids and for records that were already inactive).
    pub fn deactivate(&self, id: &str) -> Result<bool> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE alarms SET active = 0, updated_at = ?1 WHERE id = ?2 AND active = 1",
                rusqlite::params![ts(Utc::now()), id],
            )
            .map_err(|e| DeskbellError::Store(format!("Deactivate: {e}")))?;
        Ok(changed > 0)
    }

    /// Batch variant of [`deactivate`](Self::deactivate).
    pub fn deactivate_many(&self, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.conn()?;
        let now = ts(Utc::now());
        let mut changed = 0;
        for id in ids {
            changed += conn
                .execute(
                    "UPDATE alarms SET active = 0, updated_at = ?1 WHERE id = ?2 AND active = 1",
                    rusqlite::params![now, id],
                )
                .map_err(|e| DeskbellError::Store(format!("Deactivate batch: {e}")))?;
        }
        Ok(changed)
    }

    /// Age out active alarms whose notice time predates `cutoff`.
    /// Records are kept, never deleted.
    pub fn deactivate_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let changed = self
            .conn()?
            .execute(
                "UPDATE alarms SET active = 0, updated_at = ?1
                 WHERE notice_time < ?2 AND active = 1",
                rusqlite::params![ts(Utc::now()), ts(cutoff)],
            )
            .map_err(|e| DeskbellError::Store(format!("Retention: {e}")))?;
        Ok(changed)
    }

    pub fn count_active(&self) -> Result<u64> {
        self.conn()?
            .query_row("SELECT COUNT(*) FROM alarms WHERE active = 1", [], |r| {
                r.get::<_, i64>(0)
            })
            .map(|n| n as u64)
            .map_err(|e| DeskbellError::Store(format!("Count: {e}")))
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Alarm>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DeskbellError::Store(format!("Query: {e}")))?;
        let rows = stmt
            .query_map(params, row_to_alarm)
            .map_err(|e| DeskbellError::Store(format!("Query: {e}")))?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }
}

fn row_to_alarm(row: &rusqlite::Row<'_>) -> rusqlite::Result<Alarm> {
    let domain_str: String = row.get(3)?;
    let notice_str: String = row.get(6)?;
    let created_str: String = row.get(8)?;
    let updated_str: String = row.get(9)?;
    Ok(Alarm {
        id: row.get(0)?,
        recipient: row.get(1)?,
        target_id: row.get(2)?,
        domain: DomainType::from_label(&domain_str).unwrap_or(DomainType::Schedule),
        title: row.get(4)?,
        description: row.get(5)?,
        notice_time: parse_ts(&notice_str),
        active: row.get::<_, i32>(7)? != 0,
        created_at: parse_ts(&created_str),
        updated_at: parse_ts(&updated_str),
    })
}

// Fixed-width UTC strings so SQL string comparison matches
// chronological order.
fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
