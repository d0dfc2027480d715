// src/main.rs
use axum::{extract::Extension, middleware, routing::get, Json, Router};
use dotenv::dotenv;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::PathBuf;
use std::{net::SocketAddr, str::FromStr, sync::Arc};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// MODULE IMPORTS
// ============================================================================

mod auth;
mod common;
mod leave;
mod logging_middleware;
mod profile;
mod rate_limit_middleware;
mod services;

#[cfg(test)]
mod test_support;

// ============================================================================
// COMMON IMPORTS
// ============================================================================

use common::config::MailTransport;
use common::{AppConfig, AppState, SystemClock};
use rate_limit_middleware::rate_limit_middleware;
use services::{LogNotifier, Notifier, RateLimitConfig, RateLimitService, SesNotifier};

// ============================================================================
// ROUTER COMPOSITION
// ============================================================================

/// GET /api/test
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "API is working" }))
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Full application: routes plus middleware, around shared state
pub fn build_app(state: AppState, rate_limit_service: Arc<RateLimitService>) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let shared = Arc::new(RwLock::new(state));

    Router::new()
        .route("/api/test", get(health))
        // ====================================================================
        // AUTHENTICATION ROUTES (signup, verify-otp, set-password, login)
        // ====================================================================
        .merge(auth::auth_routes())
        // ====================================================================
        // STUDENT ROUTES (Profile form, Leave applications)
        // ====================================================================
        .merge(profile::profile_routes())
        .merge(leave::leave_routes())
        // ====================================================================
        // MIDDLEWARE AND LAYERS
        // ====================================================================
        .layer(middleware::from_fn(logging_middleware::log_request_response))
        .layer(middleware::from_fn(rate_limit_middleware))
        .layer(Extension(rate_limit_service))
        .layer(Extension(shared))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // ========================================================================
    // ENVIRONMENT CONFIGURATION
    // ========================================================================

    let config = AppConfig::from_env();
    info!(
        database_url = %config.database_url,
        otp_ttl_minutes = config.otp_ttl_minutes(),
        allowed_email_domain = ?config.allowed_email_domain,
        mail_transport = ?config.mail.transport,
        "Configuration loaded"
    );

    // ========================================================================
    // DATABASE SETUP
    // ========================================================================

    if let Some(path_part) = config.database_url.strip_prefix("sqlite://") {
        let path_without_params = path_part.split('?').next().unwrap_or("");
        if !path_without_params.is_empty() && !path_without_params.starts_with(':') {
            let db_path = PathBuf::from(path_without_params);
            if let Some(parent) = db_path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await?;
                }
            }
        }
    }

    let connect_options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .connect_with(connect_options)
        .await?;

    if config.reset_db {
        warn!("RESET_DB is set, dropping all tables");
    }
    common::migrations::run_migrations(&pool, config.reset_db).await?;

    // ========================================================================
    // SERVICE INITIALIZATION
    // ========================================================================

    let notifier: Arc<dyn Notifier> = match config.mail.transport {
        MailTransport::Ses => Arc::new(SesNotifier::from_config(&config.mail).await?),
        MailTransport::Log => {
            warn!("MAIL_TRANSPORT=log, OTP emails are written to the log only");
            Arc::new(LogNotifier)
        }
    };
    info!("Notifier initialized");

    let rate_limit_service = Arc::new(RateLimitService::new(RateLimitConfig::from_env()));
    RateLimitService::start_cleanup_task(rate_limit_service.clone());
    info!("RateLimitService initialized");

    // ========================================================================
    // APPLICATION STATE
    // ========================================================================

    let port = config.port;
    let app_state = AppState::new(pool, config, notifier, Arc::new(SystemClock));
    let app = build_app(app_state, rate_limit_service);

    // ========================================================================
    // SERVER STARTUP
    // ========================================================================

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
