//! # Deskbell Notify
//!
//! Notification-port implementations. One trait, four transports:
//! SMS gateway, push relay, SMTP email, and an in-memory no-op used by
//! tests and dry-run deployments. The active transport is picked by
//! configuration, not by code.

pub mod email;
pub mod noop;
pub mod push;
pub mod sms;

pub use email::EmailNotifier;
pub use noop::NoopNotifier;
pub use push::PushNotifier;
pub use sms::SmsNotifier;

use std::sync::Arc;

use deskbell_core::config::NotifyConfig;
use deskbell_core::traits::Notifier;

/// Build the configured notification transport.
///
/// Unknown modes fall back to the no-op transport so a typo in the
/// config degrades to logged-only delivery instead of a dead process.
pub fn notifier_from_config(config: &NotifyConfig) -> Arc<dyn Notifier> {
    match config.mode.as_str() {
        "sms" => Arc::new(SmsNotifier::new(config.sms.clone())),
        "push" => Arc::new(PushNotifier::new(config.push.clone())),
        "email" => Arc::new(EmailNotifier::new(config.email.clone())),
        "noop" => Arc::new(NoopNotifier::new()),
        other => {
            tracing::warn!("⚠️ Unknown notify mode '{other}', using noop");
            Arc::new(NoopNotifier::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_selects_by_mode() {
        let mut config = NotifyConfig::default();
        config.mode = "sms".into();
        assert_eq!(notifier_from_config(&config).name(), "sms");
        config.mode = "push".into();
        assert_eq!(notifier_from_config(&config).name(), "push");
        config.mode = "email".into();
        assert_eq!(notifier_from_config(&config).name(), "email");
        config.mode = "noop".into();
        assert_eq!(notifier_from_config(&config).name(), "noop");
    }

    #[test]
    fn test_factory_unknown_mode_falls_back() {
        let mut config = NotifyConfig::default();
        config.mode = "pigeon".into();
        assert_eq!(notifier_from_config(&config).name(), "noop");
    }
}
