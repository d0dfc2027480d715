// src/leave/handlers.rs

use axum::{
    extract::{Extension, Json, Query},
    http::StatusCode,
};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{ApplyLeaveRequest, LeaveApplication, LeaveQuery, LeaveSummary};
use super::services::{filter_applications, LeaveService};
use crate::auth::AuthedStudent;
use crate::common::{ApiError, AppState};

fn service(state: &AppState) -> LeaveService {
    LeaveService::new(state.db.clone(), state.clock.clone())
}

/// POST /api/leaves
///
/// # Request Body
/// ```json
/// {
///   "leaveType": "DL",
///   "startDate": "2025-02-20",
///   "endDate": "2025-02-22",
///   "reason": "IEEE Conference on AI",
///   "documents": ["invitation.pdf"]
/// }
/// ```
pub async fn apply_leave(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
    payload: Option<Json<ApplyLeaveRequest>>,
) -> Result<(StatusCode, Json<LeaveApplication>), ApiError> {
    let state = state_lock.read().await.clone();
    let Json(request) = payload.unwrap_or_default();

    let application = service(&state).apply(&authed.id, &request).await?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/leaves?status=&type=&search=
pub async fn list_leaves(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
    Query(query): Query<LeaveQuery>,
) -> Result<Json<Vec<LeaveApplication>>, ApiError> {
    let state = state_lock.read().await.clone();

    let applications = service(&state).list_for_account(&authed.id).await?;
    Ok(Json(filter_applications(applications, &query)))
}

/// GET /api/leaves/summary
pub async fn leave_summary(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
) -> Result<Json<LeaveSummary>, ApiError> {
    let state = state_lock.read().await.clone();

    let summary = service(&state).summary(&authed.id).await?;
    Ok(Json(summary))
}
