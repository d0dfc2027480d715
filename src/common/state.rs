// Application state shared across all modules

use sqlx::SqlitePool;
use std::sync::Arc;

use super::Clock;
use super::config::AppConfig;
use crate::auth::activation::{ActivationPolicy, ActivationService};
use crate::auth::store::{CredentialStore, SqliteCredentialStore};
use crate::services::Notifier;

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: AppConfig,
    pub accounts: Arc<dyn CredentialStore>,
    pub activation: Arc<ActivationService>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Wire the SQLite credential store and activation service around `db`.
    pub fn new(
        db: SqlitePool,
        config: AppConfig,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let accounts: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(db.clone()));
        let policy = ActivationPolicy {
            otp_ttl: config.otp_ttl,
            allowed_email_domain: config.allowed_email_domain.clone(),
        };
        let activation = Arc::new(ActivationService::new(
            accounts.clone(),
            notifier,
            clock.clone(),
            policy,
        ));

        Self {
            db,
            config,
            accounts,
            activation,
            clock,
        }
    }
}
