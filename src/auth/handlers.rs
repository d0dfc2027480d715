//! Authentication handlers

use axum::extract::{Extension, Json};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::models::{
    Claims, CredentialsRequest, LoginResponse, MessageResponse, SignupRequest, VerifyOtpRequest,
};
use crate::common::config::AppConfig;
use crate::common::{safe_email_log, ApiError, AppState, Clock};

/// Blank strings count as missing
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.to_string(),
    })
}

/// Sign an HS256 session token for `account_id`
pub fn issue_token(
    config: &AppConfig,
    account_id: &str,
    clock: &dyn Clock,
) -> Result<String, ApiError> {
    let exp = (clock.now() + config.session_ttl).timestamp();
    let claims = Claims {
        sub: account_id.to_string(),
        exp: exp.max(0) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, account_id = %account_id, "JWT encoding error during login");
        ApiError::InternalServer("Failed to login".to_string())
    })
}

/// POST /api/auth/signup
///
/// # Request Body
/// ```json
/// { "email": "22dit001@charusat.edu.in" }
/// ```
///
/// Creates a pending account and emails a 4-digit OTP.
pub async fn signup(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Option<Json<SignupRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let Json(payload) = payload.unwrap_or_default();

    let email = present(payload.email)
        .ok_or_else(|| ApiError::BadRequest("Email is required".to_string()))?;

    state
        .activation
        .initiate(&email)
        .await
        .map_err(|e| e.into_api_error("Failed to send OTP"))?;

    Ok(message("OTP sent to your email"))
}

/// POST /api/auth/verify-otp
///
/// # Request Body
/// ```json
/// { "email": "22dit001@charusat.edu.in", "otp": "4821" }
/// ```
pub async fn verify_otp(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Option<Json<VerifyOtpRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let Json(payload) = payload.unwrap_or_default();

    let (Some(email), Some(otp)) = (present(payload.email), present(payload.otp)) else {
        return Err(ApiError::BadRequest("Email and OTP are required".to_string()));
    };

    state
        .activation
        .verify(&email, &otp)
        .await
        .map_err(|e| e.into_api_error("Failed to verify OTP"))?;

    Ok(message("OTP verified. Please set your password"))
}

/// POST /api/auth/set-password
///
/// # Request Body
/// ```json
/// { "email": "22dit001@charusat.edu.in", "password": "..." }
/// ```
pub async fn set_password(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Option<Json<CredentialsRequest>>,
) -> Result<Json<MessageResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let Json(payload) = payload.unwrap_or_default();

    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    state
        .activation
        .set_password(&email, &password)
        .await
        .map_err(|e| e.into_api_error("Failed to set password"))?;

    Ok(message("Password set successfully. Account verified"))
}

/// POST /api/auth/login
///
/// # Response
/// ```json
/// { "message": "Login successful", "token": "<jwt>" }
/// ```
pub async fn login(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    payload: Option<Json<CredentialsRequest>>,
) -> Result<Json<LoginResponse>, ApiError> {
    let state = state_lock.read().await.clone();
    let Json(payload) = payload.unwrap_or_default();

    let (Some(email), Some(password)) = (present(payload.email), present(payload.password)) else {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    };

    let account = state
        .activation
        .login(&email, &password)
        .await
        .map_err(|e| e.into_api_error("Failed to login"))?;

    let token = issue_token(&state.config, &account.id, state.clock.as_ref())?;

    info!(
        account_id = %account.id,
        email = %safe_email_log(&account.email),
        "Session token issued"
    );

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}
