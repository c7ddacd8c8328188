//! Deskbell configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DeskbellError, Result};

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskbellConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Default for DeskbellConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            scheduler: SchedulerConfig::default(),
            sweep: SweepConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl DeskbellConfig {
    /// Load config from the default path (~/.deskbell/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeskbellError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DeskbellError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| DeskbellError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Deskbell home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".deskbell")
    }
}

/// Alarm store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path. Defaults to ~/.deskbell/alarms.db.
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

fn default_db_path() -> String {
    DeskbellConfig::home_dir()
        .join("alarms.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Timer scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Size of the firing worker pool. Fixed, independent of load.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    10
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Sweep cadence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Reconciliation sweep period in seconds.
    #[serde(default = "default_reconcile_secs")]
    pub reconcile_interval_secs: u64,
    /// Retention sweep period in seconds.
    #[serde(default = "default_retention_secs")]
    pub retention_interval_secs: u64,
    /// Active alarms whose notice time is older than this many days
    /// are aged out instead of fired.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

fn default_reconcile_secs() -> u64 {
    60
}
fn default_retention_secs() -> u64 {
    3600
}
fn default_retention_days() -> i64 {
    7
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            reconcile_interval_secs: default_reconcile_secs(),
            retention_interval_secs: default_retention_secs(),
            retention_days: default_retention_days(),
        }
    }
}

/// Notification transport selection + per-transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Which transport to use: "sms", "push", "email", or "noop".
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub sms: SmsConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

fn default_mode() -> String {
    "noop".into()
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            sms: SmsConfig::default(),
            push: PushConfig::default(),
            email: EmailConfig::default(),
        }
    }
}

/// SMS gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    /// Gateway send endpoint, e.g. "https://sms.example.com/v1/send".
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Sender number shown to recipients.
    #[serde(default)]
    pub from: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            api_key: String::new(),
            from: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Push gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Push relay endpoint, e.g. "https://push.example.com/v1/notify".
    #[serde(default)]
    pub gateway_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// SMTP configuration for the email transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// From address for outgoing reminders.
    #[serde(default)]
    pub from: String,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            from: String::new(),
        }
    }
}
