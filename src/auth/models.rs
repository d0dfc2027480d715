//! Authentication data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// JWT claims structure
#[derive(Serialize, Deserialize, Debug)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Where an account is in the activation flow
///
/// `PendingOtp -> PendingPassword -> Verified`. The state is derived from the
/// row rather than stored, so it can never disagree with the OTP columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountState {
    PendingOtp,
    PendingPassword,
    Verified,
}

impl AccountState {
    /// SQL predicate that holds exactly for rows in this state
    pub fn sql_guard(&self) -> &'static str {
        match self {
            AccountState::PendingOtp => "verified = 0 AND otp IS NOT NULL",
            AccountState::PendingPassword => "verified = 0 AND otp IS NULL",
            AccountState::Verified => "verified = 1",
        }
    }
}

/// Account database model, one row per email
#[derive(FromRow, Clone)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub verified: bool,
    pub password_hash: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Account {
    pub fn state(&self) -> AccountState {
        if self.verified {
            AccountState::Verified
        } else if self.otp.is_some() {
            AccountState::PendingOtp
        } else {
            AccountState::PendingPassword
        }
    }

    /// The supplied code matches the stored one and `now` is within the
    /// expiry (inclusive). Accounts without a pending OTP never match.
    pub fn otp_matches(&self, supplied: &str, now: DateTime<Utc>) -> bool {
        match (&self.otp, self.otp_expires_at) {
            (Some(otp), Some(expires_at)) => otp == supplied && now <= expires_at,
            _ => false,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("state", &self.state())
            .field("otp_expires_at", &self.otp_expires_at)
            .finish_non_exhaustive()
    }
}

/// Row created by signup, always in `PendingOtp`
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub email: String,
    pub otp: String,
    pub otp_expires_at: DateTime<Utc>,
}

/// Field-level update. `None` leaves a column alone, `Some(None)` clears it.
#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub otp: Option<Option<String>>,
    pub otp_expires_at: Option<Option<DateTime<Utc>>>,
    pub password_hash: Option<Option<String>>,
    pub verified: Option<bool>,
}

impl AccountPatch {
    /// OTP consumed: both columns go back to NULL
    pub fn clear_otp() -> Self {
        Self {
            otp: Some(None),
            otp_expires_at: Some(None),
            ..Self::default()
        }
    }

    pub fn activate(password_hash: String) -> Self {
        Self {
            password_hash: Some(Some(password_hash)),
            verified: Some(true),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.otp.is_none()
            && self.otp_expires_at.is_none()
            && self.password_hash.is_none()
            && self.verified.is_none()
    }
}

/// POST /api/auth/signup
#[derive(Deserialize, Debug, Default)]
pub struct SignupRequest {
    pub email: Option<String>,
}

/// POST /api/auth/verify-otp
#[derive(Deserialize, Debug, Default)]
pub struct VerifyOtpRequest {
    pub email: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub otp: Option<String>,
}

/// Clients send the OTP either as `"4821"` or as `4821`
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "otp must be a string or number, got {}",
            other
        ))),
    }
}

/// POST /api/auth/set-password and POST /api/auth/login
#[derive(Deserialize, Default)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}
