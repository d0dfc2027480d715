//! Credential store: persistence for accounts
//!
//! The store is the single arbiter for email uniqueness and for state
//! transitions. Every mutation is guarded by the state the caller expects, so
//! a request that lost a race sees "no row changed" instead of clobbering the
//! winner.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use thiserror::Error;
use tracing::{debug, error};

use super::models::{Account, AccountPatch, AccountState, NewAccount};
use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new pending account; `Duplicate` if the email exists.
    async fn create(&self, account: &NewAccount) -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError>;

    /// Apply `patch` if the account is currently in `expected`.
    /// Returns whether a row was changed.
    async fn update(
        &self,
        email: &str,
        expected: AccountState,
        patch: &AccountPatch,
    ) -> Result<bool, StoreError>;

    /// Remove an account that is still waiting on exactly this OTP.
    async fn delete_pending(&self, email: &str, otp: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Unique violation on `accounts.email`, as opposed to an id collision
fn is_email_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.message().contains("accounts.email")
        }
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn create(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let inserted = sqlx::query(
            "INSERT INTO accounts (id, email, otp, otp_expires_at, verified) VALUES (?, ?, ?, ?, 0)",
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.otp)
        .bind(account.otp_expires_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = inserted {
            if is_email_conflict(&e) {
                debug!(email = %safe_email_log(&account.email), "Signup rejected by unique constraint");
                return Err(StoreError::Duplicate);
            }
            error!(
                error = %e,
                email = %safe_email_log(&account.email),
                "Database error inserting account"
            );
            return Err(StoreError::Database(e));
        }

        let created = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(&account.id)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn update(
        &self,
        email: &str,
        expected: AccountState,
        patch: &AccountPatch,
    ) -> Result<bool, StoreError> {
        if patch.is_empty() {
            return Ok(false);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE accounts SET updated_at = datetime('now')");
        if let Some(otp) = &patch.otp {
            qb.push(", otp = ").push_bind(otp.clone());
        }
        if let Some(expires_at) = &patch.otp_expires_at {
            qb.push(", otp_expires_at = ").push_bind(*expires_at);
        }
        if let Some(hash) = &patch.password_hash {
            qb.push(", password_hash = ").push_bind(hash.clone());
        }
        if let Some(verified) = patch.verified {
            qb.push(", verified = ").push_bind(verified);
        }
        qb.push(" WHERE email = ").push_bind(email.to_string());
        qb.push(" AND ").push(expected.sql_guard());

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete_pending(&self, email: &str, otp: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "DELETE FROM accounts WHERE email = ? AND verified = 0 AND otp = ?",
        )
        .bind(email)
        .bind(otp)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_pool;
    use chrono::{TimeZone, Utc};

    fn pending(id: &str, email: &str, otp: &str) -> NewAccount {
        NewAccount {
            id: id.to_string(),
            email: email.to_string(),
            otp: otp.to_string(),
            otp_expires_at: Utc.with_ymd_and_hms(2025, 1, 15, 9, 5, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = SqliteCredentialStore::new(memory_pool().await);
        let created = store.create(&pending("U_AAAAAA", "a@x.edu", "4821")).await.unwrap();

        assert_eq!(created.state(), AccountState::PendingOtp);
        assert_eq!(created.otp.as_deref(), Some("4821"));
        assert!(!created.verified);

        let by_id = store.find_by_id("U_AAAAAA").await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.edu");
        assert_eq!(by_id.otp_expires_at, created.otp_expires_at);
        assert!(store.find_by_email("b@x.edu").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected_by_constraint() {
        let store = SqliteCredentialStore::new(memory_pool().await);
        store.create(&pending("U_AAAAAA", "a@x.edu", "4821")).await.unwrap();

        let err = store
            .create(&pending("U_BBBBBB", "a@x.edu", "1111"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));

        // an id collision is not reported as a duplicate email
        let err = store
            .create(&pending("U_AAAAAA", "c@x.edu", "1111"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
    }

    #[tokio::test]
    async fn test_update_is_guarded_by_state() {
        let store = SqliteCredentialStore::new(memory_pool().await);
        store.create(&pending("U_AAAAAA", "a@x.edu", "4821")).await.unwrap();

        // not yet in PendingPassword
        let activated = store
            .update("a@x.edu", AccountState::PendingPassword, &AccountPatch::activate("h".into()))
            .await
            .unwrap();
        assert!(!activated);

        assert!(store
            .update("a@x.edu", AccountState::PendingOtp, &AccountPatch::clear_otp())
            .await
            .unwrap());
        // second clear loses the race
        assert!(!store
            .update("a@x.edu", AccountState::PendingOtp, &AccountPatch::clear_otp())
            .await
            .unwrap());

        let account = store.find_by_email("a@x.edu").await.unwrap().unwrap();
        assert_eq!(account.state(), AccountState::PendingPassword);
        assert!(account.otp_expires_at.is_none());

        assert!(!store
            .update("a@x.edu", AccountState::Verified, &AccountPatch::default())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_delete_pending_requires_matching_otp() {
        let store = SqliteCredentialStore::new(memory_pool().await);
        store.create(&pending("U_AAAAAA", "a@x.edu", "4821")).await.unwrap();

        assert!(!store.delete_pending("a@x.edu", "1111").await.unwrap());
        assert!(store.delete_pending("a@x.edu", "4821").await.unwrap());
        assert!(store.find_by_email("a@x.edu").await.unwrap().is_none());
    }
}
