//! Account activation: signup -> OTP verify -> password set -> login
//!
//! ```text
//! initiate      verify         set_password
//!  ───────▶ PendingOtp ───▶ PendingPassword ───▶ Verified
//! ```
//!
//! `login` only reads `Verified` accounts. OTP state lives on the account row,
//! so pending verifications survive restarts and work across instances.

use chrono::Duration;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::models::{Account, AccountPatch, AccountState, NewAccount};
use super::otp::generate_otp;
use super::password::{self, PasswordError};
use super::store::{CredentialStore, StoreError};
use crate::common::Clock;
use crate::common::{
    email_in_domain, generate_account_id, is_valid_email, normalize_email, safe_email_log,
    ApiError,
};
use crate::services::email::otp_email;
use crate::services::{Notifier, NotifyError};

#[derive(Debug, Error)]
pub enum ActivationError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Email already registered")]
    AlreadyRegistered,

    #[error("User not found")]
    AccountNotFound,

    #[error("Invalid or expired OTP")]
    InvalidOrExpired,

    #[error("User not found or already verified")]
    NotFoundOrAlreadyVerified,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Failed to send OTP")]
    NotificationFailed(#[source] NotifyError),

    #[error("credential store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),
}

impl ActivationError {
    /// Map to the HTTP error. `dependency_message` is what the client sees
    /// when the store or hasher fails, e.g. "Failed to verify OTP".
    pub fn into_api_error(self, dependency_message: &str) -> ApiError {
        match self {
            ActivationError::InvalidInput(msg) => ApiError::BadRequest(msg),
            e @ ActivationError::AlreadyRegistered => ApiError::BadRequest(e.to_string()),
            e @ ActivationError::AccountNotFound => ApiError::NotFound(e.to_string()),
            e @ ActivationError::InvalidOrExpired => ApiError::BadRequest(e.to_string()),
            e @ ActivationError::NotFoundOrAlreadyVerified => ApiError::BadRequest(e.to_string()),
            e @ ActivationError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            e @ ActivationError::NotificationFailed(_) => ApiError::InternalServer(e.to_string()),
            ActivationError::Store(e) => {
                error!(error = %e, "Credential store failure");
                ApiError::InternalServer(dependency_message.to_string())
            }
            ActivationError::Password(e) => {
                error!(error = %e, "Password hashing failure");
                ApiError::InternalServer(dependency_message.to_string())
            }
        }
    }
}

impl From<ActivationError> for ApiError {
    fn from(err: ActivationError) -> Self {
        err.into_api_error("Internal server error")
    }
}

/// Signup rules that come from configuration
#[derive(Debug, Clone)]
pub struct ActivationPolicy {
    pub otp_ttl: Duration,
    pub allowed_email_domain: Option<String>,
}

impl Default for ActivationPolicy {
    fn default() -> Self {
        Self {
            otp_ttl: Duration::minutes(5),
            allowed_email_domain: None,
        }
    }
}

pub struct ActivationService {
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    policy: ActivationPolicy,
}

impl ActivationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        policy: ActivationPolicy,
    ) -> Self {
        Self {
            store,
            notifier,
            clock,
            policy,
        }
    }

    fn validate_signup_email(&self, email: &str) -> Result<(), ActivationError> {
        if email.is_empty() {
            return Err(ActivationError::InvalidInput("Email is required".to_string()));
        }
        if !is_valid_email(email) {
            return Err(ActivationError::InvalidInput("Invalid email address".to_string()));
        }
        if let Some(domain) = &self.policy.allowed_email_domain {
            if !email_in_domain(email, domain) {
                return Err(ActivationError::InvalidInput(format!(
                    "Please use a valid @{} email address",
                    domain
                )));
            }
        }
        Ok(())
    }

    /// Create a `PendingOtp` account and email its code.
    ///
    /// The unique constraint decides duplicates. If the email cannot be
    /// delivered the account is removed again so the student can retry.
    pub async fn initiate(&self, raw_email: &str) -> Result<(), ActivationError> {
        let email = normalize_email(raw_email);
        self.validate_signup_email(&email)?;

        let otp = generate_otp();
        let new_account = NewAccount {
            id: generate_account_id(),
            email: email.clone(),
            otp: otp.clone(),
            otp_expires_at: self.clock.now() + self.policy.otp_ttl,
        };

        match self.store.create(&new_account).await {
            Ok(account) => {
                debug!(account_id = %account.id, email = %safe_email_log(&email), "Pending account created");
            }
            Err(StoreError::Duplicate) => {
                warn!(email = %safe_email_log(&email), "Signup for already registered email");
                return Err(ActivationError::AlreadyRegistered);
            }
            Err(e) => return Err(e.into()),
        }

        let message = otp_email(&otp, self.policy.otp_ttl.num_minutes());
        if let Err(e) = self.notifier.send(&email, &message.subject, &message.body).await {
            error!(error = %e, email = %safe_email_log(&email), "OTP delivery failed, removing pending account");
            match self.store.delete_pending(&email, &otp).await {
                Ok(true) => {}
                Ok(false) => warn!(email = %safe_email_log(&email), "Pending account changed before cleanup"),
                Err(cleanup) => error!(error = %cleanup, email = %safe_email_log(&email), "Failed to remove pending account"),
            }
            return Err(ActivationError::NotificationFailed(e));
        }

        info!(email = %safe_email_log(&email), "OTP sent");
        Ok(())
    }

    /// Consume the OTP: `PendingOtp -> PendingPassword`.
    pub async fn verify(&self, raw_email: &str, supplied_otp: &str) -> Result<(), ActivationError> {
        let email = normalize_email(raw_email);
        let account = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(ActivationError::AccountNotFound)?;

        if !account.otp_matches(supplied_otp.trim(), self.clock.now()) {
            warn!(email = %safe_email_log(&email), "OTP rejected");
            return Err(ActivationError::InvalidOrExpired);
        }

        let cleared = self
            .store
            .update(&email, AccountState::PendingOtp, &AccountPatch::clear_otp())
            .await?;
        if !cleared {
            return Err(ActivationError::InvalidOrExpired);
        }

        info!(account_id = %account.id, "OTP verified");
        Ok(())
    }

    /// Store the password hash: `PendingPassword -> Verified`.
    ///
    /// Accounts still in `PendingOtp` are refused with the same error as
    /// missing or verified ones, so the OTP step cannot be skipped.
    pub async fn set_password(&self, raw_email: &str, password: &str) -> Result<(), ActivationError> {
        let email = normalize_email(raw_email);
        let account = match self.store.find_by_email(&email).await? {
            Some(account) if account.state() == AccountState::PendingPassword => account,
            Some(account) => {
                warn!(account_id = %account.id, state = ?account.state(), "set-password in wrong state");
                return Err(ActivationError::NotFoundOrAlreadyVerified);
            }
            None => return Err(ActivationError::NotFoundOrAlreadyVerified),
        };

        let hash = password::hash_password_async(password.to_string()).await?;
        let activated = self
            .store
            .update(&email, AccountState::PendingPassword, &AccountPatch::activate(hash))
            .await?;
        if !activated {
            return Err(ActivationError::NotFoundOrAlreadyVerified);
        }

        info!(account_id = %account.id, "Account verified");
        Ok(())
    }

    /// Check credentials. Unknown email, unverified account and wrong password
    /// all give `InvalidCredentials`.
    pub async fn login(&self, raw_email: &str, password: &str) -> Result<Account, ActivationError> {
        let email = normalize_email(raw_email);
        let account = match self.store.find_by_email(&email).await? {
            Some(account) if account.verified => account,
            _ => return Err(ActivationError::InvalidCredentials),
        };

        let Some(hash) = account.password_hash.clone() else {
            return Err(ActivationError::InvalidCredentials);
        };

        match password::verify_password_async(password.to_string(), hash).await {
            Ok(true) => {
                info!(account_id = %account.id, "Login successful");
                Ok(account)
            }
            Ok(false) => Err(ActivationError::InvalidCredentials),
            Err(e) => {
                error!(error = %e, account_id = %account.id, "Stored password hash unusable");
                Err(ActivationError::InvalidCredentials)
            }
        }
    }
}
