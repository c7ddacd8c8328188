//! The notification port.
//!
//! A single capability: deliver one message to one recipient. Retry
//! policy, if any, belongs to the caller — the timer treats a failure
//! as terminal for that firing.

use async_trait::async_trait;

use crate::error::Result;

/// Outbound notification transport.
///
/// `recipient` is transport-shaped: a phone number for SMS/push, an
/// address for email. Message formatting happens before this call.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transport name, for logs.
    fn name(&self) -> &str;

    /// Deliver `message` to `recipient`. One attempt, no backoff.
    /// Transport timeouts surface as `DeskbellError::Delivery`.
    async fn deliver(&self, recipient: &str, message: &str) -> Result<()>;
}
