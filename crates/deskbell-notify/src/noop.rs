//! No-op transport — records deliveries instead of sending them.
//!
//! Serves two roles: dry-run deployments (every delivery is logged and
//! kept in a small in-memory history) and tests, which inspect the
//! history to assert on exactly-once delivery.

use std::sync::Mutex;

use async_trait::async_trait;

use deskbell_core::error::{DeskbellError, Result};
use deskbell_core::traits::Notifier;

const HISTORY_CAP: usize = 100;

/// Recording transport. `failing()` builds a variant whose every
/// delivery fails, for exercising failure paths.
pub struct NoopNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl NoopNotifier {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A transport that rejects every delivery.
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Recorded (recipient, message) pairs, oldest first.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Default for NoopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn deliver(&self, recipient: &str, message: &str) -> Result<()> {
        if self.fail {
            return Err(DeskbellError::Delivery("noop transport set to fail".into()));
        }
        tracing::info!("📋 [noop] would deliver to {recipient}: {message}");
        let mut sent = self.sent.lock().unwrap();
        sent.push((recipient.to_string(), message.to_string()));
        // Ring buffer — keep last 100
        if sent.len() > HISTORY_CAP {
            sent.remove(0);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_deliveries() {
        let sender = NoopNotifier::new();
        sender.deliver("010-1234-5678", "standup").await.unwrap();
        sender.deliver("010-9999-0000", "retro").await.unwrap();
        let sent = sender.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].0, "010-1234-5678");
        assert_eq!(sent[1].1, "retro");
    }

    #[tokio::test]
    async fn test_failing_variant_rejects() {
        let sender = NoopNotifier::failing();
        let err = sender.deliver("010-1234-5678", "hi").await.unwrap_err();
        assert!(matches!(err, DeskbellError::Delivery(_)));
        assert_eq!(sender.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let sender = NoopNotifier::new();
        for i in 0..120 {
            sender.deliver("010-1234-5678", &format!("m{i}")).await.unwrap();
        }
        assert_eq!(sender.sent_count(), HISTORY_CAP);
        assert_eq!(sender.sent()[0].1, "m20");
    }
}
