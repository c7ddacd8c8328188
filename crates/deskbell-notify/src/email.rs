//! Email transport — SMTP via lettre.
//!
//! Used when a recipient prefers mail over SMS; `recipient` is then an
//! email address. The first line of the message becomes the subject.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use deskbell_core::config::EmailConfig;
use deskbell_core::error::{DeskbellError, Result};
use deskbell_core::traits::Notifier;

/// Sends messages over SMTP.
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
            .map_err(|e| DeskbellError::Delivery(format!("SMTP relay: {e}")))?;
        Ok(builder
            .port(self.config.smtp_port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build())
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &str {
        "email"
    }

    async fn deliver(&self, recipient: &str, message: &str) -> Result<()> {
        let from: Mailbox = self
            .config
            .from
            .parse()
            .map_err(|e| DeskbellError::Delivery(format!("bad from address: {e}")))?;
        let to: Mailbox = recipient
            .parse()
            .map_err(|e| DeskbellError::Delivery(format!("bad recipient address: {e}")))?;

        let subject = message.lines().next().unwrap_or("Reminder");
        let mail = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .body(message.to_string())
            .map_err(|e| DeskbellError::Delivery(format!("build mail: {e}")))?;

        self.transport()?
            .send(mail)
            .await
            .map_err(|e| DeskbellError::Delivery(format!("SMTP send: {e}")))?;

        tracing::info!("📧 Email sent to {recipient}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bad_recipient_address_is_delivery_error() {
        let sender = EmailNotifier::new(EmailConfig {
            from: "deskbell@example.com".into(),
            ..EmailConfig::default()
        });
        let err = sender.deliver("not-an-address", "hi").await.unwrap_err();
        assert!(matches!(err, DeskbellError::Delivery(_)));
    }
}
