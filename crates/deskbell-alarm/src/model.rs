//! Alarm data model — requests, persisted records, domain types.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The category of object an alarm is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    Schedule,
    Task,
    Education,
    Club,
    Document,
}

impl DomainType {
    /// Human label used in delivery messages and as the stored key.
    pub fn label(&self) -> &'static str {
        match self {
            DomainType::Schedule => "schedule",
            DomainType::Task => "task",
            DomainType::Education => "education",
            DomainType::Club => "club",
            DomainType::Document => "document",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s {
            "schedule" => Some(DomainType::Schedule),
            "task" => Some(DomainType::Task),
            "education" => Some(DomainType::Education),
            "club" => Some(DomainType::Club),
            "document" => Some(DomainType::Document),
            _ => None,
        }
    }
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A caller-supplied request to schedule one alarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmRequest {
    /// Recipient phone number.
    pub recipient: String,
    /// ID of the domain object this alarm concerns (schedule ID, task ID, ...).
    pub target_id: String,
    pub domain: DomainType,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// When to notify.
    pub notice_time: DateTime<Utc>,
}

impl AlarmRequest {
    pub fn new(
        recipient: &str,
        target_id: &str,
        domain: DomainType,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self {
            recipient: recipient.to_string(),
            target_id: target_id.to_string(),
            domain,
            title: title.to_string(),
            description: description.map(String::from),
            notice_time,
        }
    }

    /// Schedule reminder.
    pub fn for_schedule(
        recipient: &str,
        schedule_id: &str,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self::new(recipient, schedule_id, DomainType::Schedule, title, description, notice_time)
    }

    /// Task deadline reminder.
    pub fn for_task(
        recipient: &str,
        task_id: &str,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self::new(recipient, task_id, DomainType::Task, title, description, notice_time)
    }

    /// Training session reminder.
    pub fn for_education(
        recipient: &str,
        education_id: &str,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self::new(recipient, education_id, DomainType::Education, title, description, notice_time)
    }

    /// Club event reminder.
    pub fn for_club(
        recipient: &str,
        club_id: &str,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self::new(recipient, club_id, DomainType::Club, title, description, notice_time)
    }

    /// Document deadline reminder.
    pub fn for_document(
        recipient: &str,
        document_id: &str,
        title: &str,
        description: Option<&str>,
        notice_time: DateTime<Utc>,
    ) -> Self {
        Self::new(recipient, document_id, DomainType::Document, title, description, notice_time)
    }

    /// Required fields present and non-blank.
    pub fn is_valid(&self) -> bool {
        !self.recipient.trim().is_empty()
            && !self.target_id.trim().is_empty()
            && !self.title.trim().is_empty()
    }

    /// Notice time strictly after now. Registration must fail otherwise.
    pub fn is_future(&self) -> bool {
        self.notice_time > Utc::now()
    }
}

/// A persisted alarm commitment. Owned by the store once created;
/// `active` goes false exactly once (fired, cancelled, or aged out)
/// and never comes back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub id: String,
    pub recipient: String,
    pub target_id: String,
    pub domain: DomainType,
    pub title: String,
    pub description: Option<String>,
    pub notice_time: DateTime<Utc>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alarm {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The delivery message body. Built here, on the firing path —
    /// transports receive finished text.
    pub fn message(&self) -> String {
        let mut msg = format!("[{} reminder]\nTitle: {}", self.domain.label(), self.title);
        if let Some(desc) = &self.description {
            if !desc.trim().is_empty() {
                msg.push_str(&format!("\nDetails: {desc}"));
            }
        }
        msg.push_str(&format!("\nTime: {}", self.notice_time.format("%Y-%m-%d %H:%M")));
        msg
    }
}

/// Korean mobile number check: 010/011/016/017/018/019 prefix,
/// 3-4 digit middle group, 4 digit tail, dashes optional.
pub fn is_valid_phone(phone: &str) -> bool {
    static PHONE_RE: OnceLock<Regex> = OnceLock::new();
    let re = PHONE_RE.get_or_init(|| {
        Regex::new(r"^01[016789]-?\d{3,4}-?\d{4}$").expect("phone regex")
    });
    re.is_match(phone.trim())
}
