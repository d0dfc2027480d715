//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::models::Claims;
use crate::common::{safe_email_log, ApiError, AppState};

/// Authenticated student extractor
///
/// Validates the session JWT and loads the account it names. Only verified
/// accounts get through; anything else is a 401.
#[derive(Debug, Clone)]
pub struct AuthedStudent {
    pub id: String,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedStudent
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        let token = match token {
            Some(t) => t,
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized("missing auth".into()));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = if let Some(rest) = token.strip_prefix("Bearer ") {
            rest.trim().to_string()
        } else {
            token
        };

        // Expiry is checked against the app clock below
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;

        let decoded = match decode::<Claims>(
            &bare_token,
            &DecodingKey::from_secret(app_state.config.jwt_secret.as_bytes()),
            &validation,
        ) {
            Ok(d) => d,
            Err(e) => {
                warn!(error = %e, "JWT token validation failed");
                return Err(ApiError::Unauthorized("invalid token".into()));
            }
        };

        let now = app_state.clock.now().timestamp();
        if (decoded.claims.exp as i64) < now {
            warn!(account_id = %decoded.claims.sub, "JWT token expired");
            return Err(ApiError::Unauthorized("token expired".into()));
        }

        let account_id = decoded.claims.sub;

        let account = app_state.accounts.find_by_id(&account_id).await.map_err(|e| {
            error!(
                error = %e,
                account_id = %account_id,
                "Store error during account lookup in authentication"
            );
            ApiError::InternalServer("Failed to authenticate".to_string())
        })?;

        match account {
            Some(a) if a.verified => {
                debug!(
                    account_id = %a.id,
                    email = %safe_email_log(&a.email),
                    "Student authenticated via extractor"
                );
                Ok(AuthedStudent {
                    id: a.id,
                    email: a.email,
                })
            }
            Some(a) => {
                warn!(account_id = %a.id, "Authentication failed: account not verified");
                Err(ApiError::Unauthorized("account not verified".into()))
            }
            None => {
                warn!(account_id = %account_id, "Authentication failed: account not found");
                Err(ApiError::Unauthorized("user not found".into()))
            }
        }
    }
}
