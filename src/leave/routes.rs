// src/leave/routes.rs

use axum::{routing::get, Router};

use super::handlers;

/// # Routes
/// - `POST /api/leaves` - Apply for leave
/// - `GET /api/leaves` - List own applications, with filters
/// - `GET /api/leaves/summary` - Leave usage this year
pub fn leave_routes() -> Router {
    Router::new()
        .route(
            "/api/leaves",
            get(handlers::list_leaves).post(handlers::apply_leave),
        )
        .route("/api/leaves/summary", get(handlers::leave_summary))
}
