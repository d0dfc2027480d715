// src/services/notifier.rs
//! Outbound notification seam used by the signup flow

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail transport not configured: {0}")]
    NotConfigured(String),

    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

/// Delivers a message to a single recipient
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Development transport: writes the message to the log instead of sending it
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(
            to = %safe_email_log(to),
            subject = %subject,
            body = %body,
            "📧 Email (log transport, not delivered)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier
            .send("a@x.edu", "Your OTP for Verification", "Your OTP is: 1234.")
            .await
            .is_ok());
    }
}
