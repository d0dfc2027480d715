//! Authentication routes

use axum::{routing::post, Router};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `POST /api/auth/signup` - Start signup, email an OTP
/// - `POST /api/auth/verify-otp` - Confirm the OTP
/// - `POST /api/auth/set-password` - Set the password, activating the account
/// - `POST /api/auth/login` - Exchange credentials for a session token
pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/signup", post(handlers::signup))
        .route("/api/auth/verify-otp", post(handlers::verify_otp))
        .route("/api/auth/set-password", post(handlers::set_password))
        .route("/api/auth/login", post(handlers::login))
}
