// src/services/email.rs
//! Email templates sent by the portal

/// A rendered email ready for a `Notifier`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
}

pub const OTP_SUBJECT: &str = "Your OTP for Verification";

/// Signup OTP email
pub fn otp_email(otp: &str, ttl_minutes: i64) -> EmailMessage {
    let unit = if ttl_minutes == 1 { "minute" } else { "minutes" };
    EmailMessage {
        subject: OTP_SUBJECT.to_string(),
        body: format!("Your OTP is: {}. It expires in {} {}.", otp, ttl_minutes, unit),
    }
}
