//! Deskbell error taxonomy.
//!
//! One enum for the whole workspace. Validation and NotFound surface to
//! callers; Delivery and Scheduling are logged and absorbed inside the
//! firing paths — nothing here is allowed to take the process down.

use thiserror::Error;

/// All errors produced by Deskbell components.
#[derive(Debug, Error)]
pub enum DeskbellError {
    /// Malformed or missing request fields, non-future notice time,
    /// malformed recipient. Surfaced to the caller, never retried.
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown alarm identifier on cancel/get. Surfaced, not fatal.
    #[error("not found: {0}")]
    NotFound(String),

    /// Alarm store (SQLite) failure.
    #[error("store error: {0}")]
    Store(String),

    /// Notification transport failure. Terminal for that firing.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Timer registration failure. The reconciliation sweep recovers.
    #[error("scheduling failed: {0}")]
    Scheduling(String),

    /// Configuration load/parse failure.
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DeskbellError>;

impl DeskbellError {
    /// Whether this error should be reported back to the requester
    /// (as opposed to logged and absorbed by a background path).
    pub fn is_caller_fault(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = DeskbellError::Validation("notice time must be in the future".into());
        assert!(err.to_string().contains("notice time"));
    }

    #[test]
    fn test_caller_fault_classification() {
        assert!(DeskbellError::NotFound("a-1".into()).is_caller_fault());
        assert!(!DeskbellError::Delivery("gateway 502".into()).is_caller_fault());
        assert!(!DeskbellError::Scheduling("pool rejected".into()).is_caller_fault());
    }
}
