//! Push transport — HTTP POST to the push relay.
//!
//! The relay resolves the recipient's phone number to their registered
//! device tokens; Deskbell does not track devices itself.

use async_trait::async_trait;

use deskbell_core::config::PushConfig;
use deskbell_core::error::{DeskbellError, Result};
use deskbell_core::traits::Notifier;

use crate::sms::mask_phone;

/// Sends messages through an HTTP push relay.
pub struct PushNotifier {
    config: PushConfig,
    client: reqwest::Client,
}

impl PushNotifier {
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    fn name(&self) -> &str {
        "push"
    }

    async fn deliver(&self, recipient: &str, message: &str) -> Result<()> {
        if self.config.gateway_url.is_empty() {
            return Err(DeskbellError::Delivery("push relay URL not configured".into()));
        }

        let resp = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "recipient": recipient,
                "message": message,
            }))
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| DeskbellError::Delivery(format!("push send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("🔔 Push sent to {}", mask_phone(recipient));
            Ok(())
        } else {
            let status = resp.status();
            Err(DeskbellError::Delivery(format!("push relay error {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_relay_is_delivery_error() {
        let sender = PushNotifier::new(PushConfig::default());
        let err = sender.deliver("010-1234-5678", "hi").await.unwrap_err();
        assert!(matches!(err, DeskbellError::Delivery(_)));
    }
}
