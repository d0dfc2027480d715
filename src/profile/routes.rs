// src/profile/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn profile_routes() -> Router {
    Router::new()
        .route(
            "/api/students/me/profile",
            get(handlers::get_profile).put(handlers::save_step),
        )
        .route(
            "/api/students/me/profile/submit",
            post(handlers::submit_profile),
        )
}
