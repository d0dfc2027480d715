//! Shared fixtures for unit and router tests

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};

use crate::auth::activation::ActivationService;
use crate::common::clock::ManualClock;
use crate::common::migrations::run_migrations;
use crate::common::{AppConfig, AppState};
use crate::services::{Notifier, NotifyError, RateLimitConfig, RateLimitService};

/// In-memory database with the real schema. One connection, so every query
/// sees the same database.
pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool, false).await.unwrap();
    pool
}

pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap(),
    ))
}

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every message instead of sending it
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<SentMessage>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// The 4-digit code from the most recent message to `to`
    pub fn last_otp_for(&self, to: &str) -> Option<String> {
        self.sent()
            .iter()
            .rev()
            .find(|m| m.to == to)
            .and_then(|m| {
                m.body
                    .split(|c: char| !c.is_ascii_digit())
                    .find(|part| part.len() == 4)
                    .map(str::to_string)
            })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(SentMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Fails the first `failures` sends, then succeeds
#[derive(Debug, Default)]
pub struct FailingNotifier {
    remaining_failures: Mutex<u32>,
}

impl FailingNotifier {
    pub fn new(failures: u32) -> Self {
        Self {
            remaining_failures: Mutex::new(failures),
        }
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> Result<(), NotifyError> {
        let mut remaining = self.remaining_failures.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(NotifyError::Delivery("smtp unreachable".to_string()));
        }
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: "test_secret_key".to_string(),
        allowed_email_domain: Some("charusat.edu.in".to_string()),
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: AppConfig) -> Self {
        let pool = memory_pool().await;
        let notifier = Arc::new(RecordingNotifier::default());
        let clock = manual_clock();
        let state = AppState::new(pool, config, notifier.clone(), clock.clone());
        Self {
            state,
            notifier,
            clock,
        }
    }

    pub fn activation(&self) -> Arc<ActivationService> {
        self.state.activation.clone()
    }

    /// Full application router with rate limiting switched off
    pub fn router(&self) -> axum::Router {
        let limiter = Arc::new(RateLimitService::new(RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        }));
        crate::build_app(self.state.clone(), limiter)
    }

    /// Run the whole activation flow and return the account id
    pub async fn verified_account(&self, email: &str, password: &str) -> String {
        let activation = self.activation();
        activation.initiate(email).await.unwrap();
        let otp = self.notifier.last_otp_for(email).unwrap();
        activation.verify(email, &otp).await.unwrap();
        activation.set_password(email, password).await.unwrap();
        activation.login(email, password).await.unwrap().id
    }

    /// Signed session token for `account_id`, as login would issue it
    pub fn token_for(&self, account_id: &str) -> String {
        crate::auth::handlers::issue_token(&self.state.config, account_id, self.clock.as_ref())
            .unwrap()
    }
}

/// Drive one request through `router`, returning status and JSON body
pub async fn send_json(
    router: axum::Router,
    method: axum::http::Method,
    uri: &str,
    body: Option<serde_json::Value>,
    token: Option<&str>,
) -> (axum::http::StatusCode, serde_json::Value) {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
