// src/services/ses.rs
//! AWS SES v2 transport for OTP emails

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sesv2::config::{Credentials, Region};
use aws_sdk_sesv2::types::{Body as SesBody, Content, Destination, EmailContent, Message};
use aws_sdk_sesv2::Client as SesClient;
use tracing::{error, info};

use super::notifier::{Notifier, NotifyError};
use crate::common::config::MailConfig;
use crate::common::safe_email_log;

#[derive(Debug, Clone)]
pub struct SesNotifier {
    client: SesClient,
    from_email: String,
}

impl SesNotifier {
    /// Build an SES client from mail settings
    ///
    /// Explicit access keys win; otherwise the default AWS credential chain
    /// (environment, profile, instance role) is used.
    pub async fn from_config(config: &MailConfig) -> Result<Self, NotifyError> {
        let from_email = config
            .ses_from_email
            .clone()
            .ok_or_else(|| NotifyError::NotConfigured("AWS_SES_FROM_EMAIL is not set".to_string()))?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.ses_region.clone()));

        if let (Some(key_id), Some(secret)) =
            (&config.aws_access_key_id, &config.aws_secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                key_id.as_str(),
                secret.as_str(),
                None,
                None,
                "environment",
            ));
        }

        let aws_config = loader.load().await;
        info!(region = %config.ses_region, "SES client initialized");

        Ok(Self {
            client: SesClient::new(&aws_config),
            from_email,
        })
    }
}

#[async_trait]
impl Notifier for SesNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let destination = Destination::builder().to_addresses(to).build();

        let subject_content = Content::builder()
            .data(subject)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotifyError::Delivery(format!("Failed to build subject: {}", e)))?;

        let body_content = Content::builder()
            .data(body)
            .charset("UTF-8")
            .build()
            .map_err(|e| NotifyError::Delivery(format!("Failed to build body: {}", e)))?;

        let message = Message::builder()
            .subject(subject_content)
            .body(SesBody::builder().text(body_content).build())
            .build();

        let result = self
            .client
            .send_email()
            .from_email_address(&self.from_email)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, to = %safe_email_log(to), "Failed to send email via SES");
                NotifyError::Delivery(format!("Send failed: {}", e))
            })?;

        info!(
            to = %safe_email_log(to),
            message_id = ?result.message_id(),
            "Email sent successfully via SES"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_sender_is_not_configured() {
        let config = MailConfig::default();
        let result = SesNotifier::from_config(&config).await;
        assert!(matches!(result, Err(NotifyError::NotConfigured(_))));
    }
}
