//! SMS transport — HTTP POST to the carrier gateway.

use async_trait::async_trait;

use deskbell_core::config::SmsConfig;
use deskbell_core::error::{DeskbellError, Result};
use deskbell_core::traits::Notifier;

/// Sends messages through an HTTP SMS gateway.
pub struct SmsNotifier {
    config: SmsConfig,
    client: reqwest::Client,
}

impl SmsNotifier {
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn name(&self) -> &str {
        "sms"
    }

    async fn deliver(&self, recipient: &str, message: &str) -> Result<()> {
        if self.config.gateway_url.is_empty() {
            return Err(DeskbellError::Delivery("SMS gateway URL not configured".into()));
        }

        let resp = self
            .client
            .post(&self.config.gateway_url)
            .bearer_auth(&self.config.api_key)
            .json(&serde_json::json!({
                "to": recipient,
                "from": self.config.from,
                "text": message,
            }))
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| DeskbellError::Delivery(format!("SMS send failed: {e}")))?;

        if resp.status().is_success() {
            tracing::info!("📱 SMS sent to {}", mask_phone(recipient));
            Ok(())
        } else {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            Err(DeskbellError::Delivery(format!("SMS gateway error {status}: {body}")))
        }
    }
}

/// Mask the middle group of a phone number for logs.
/// `010-1234-5678` → `010-****-5678`.
pub(crate) fn mask_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        11 => format!("{}-****-{}", &digits[..3], &digits[7..]),
        10 => format!("{}-***-{}", &digits[..3], &digits[6..]),
        _ => "****".into(),
    }
}
