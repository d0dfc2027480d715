// src/profile/handlers.rs

use axum::extract::{Extension, Json};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::models::{
    FormStep, ProfileStatus, StudentProfile, StudentProfileData, StudentProfileRow,
    UpdateProfileRequest,
};
use super::validators::{ProfileValidator, StepValidator};
use crate::auth::AuthedStudent;
use crate::common::{ApiError, AppState, Validator};

async fn load_profile(
    state: &AppState,
    authed: &AuthedStudent,
) -> Result<StudentProfile, ApiError> {
    let row = sqlx::query_as::<_, StudentProfileRow>(
        "SELECT * FROM student_profiles WHERE account_id = ?",
    )
    .bind(&authed.id)
    .fetch_optional(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, account_id = %authed.id, "Database error loading profile");
        ApiError::DatabaseError(e)
    })?;

    match row {
        Some(row) => StudentProfile::from_row(row).map_err(|e| {
            error!(error = %e, account_id = %authed.id, "Stored profile is not valid JSON");
            ApiError::InternalServer("Failed to load profile".to_string())
        }),
        None => Ok(StudentProfile::draft(StudentProfileData::with_defaults(
            &authed.email,
            &state.config.institute_name,
        ))),
    }
}

async fn save_profile(
    db: &SqlitePool,
    account_id: &str,
    profile: &StudentProfile,
) -> Result<(), ApiError> {
    let data = serde_json::to_string(&profile.data).map_err(|e| {
        error!(error = %e, account_id = %account_id, "Failed to serialize profile");
        ApiError::InternalServer("Failed to save profile".to_string())
    })?;

    sqlx::query(
        r#"
        INSERT INTO student_profiles (account_id, data, current_step, status, submitted_at, updated_at)
        VALUES (?, ?, ?, ?, ?, datetime('now'))
        ON CONFLICT(account_id) DO UPDATE SET
            data = excluded.data,
            current_step = excluded.current_step,
            status = excluded.status,
            submitted_at = excluded.submitted_at,
            updated_at = datetime('now')
        "#,
    )
    .bind(account_id)
    .bind(data)
    .bind(profile.current_step)
    .bind(profile.status.as_str())
    .bind(profile.submitted_at.as_deref())
    .execute(db)
    .await
    .map_err(|e| {
        error!(error = %e, account_id = %account_id, "Database error saving profile");
        ApiError::DatabaseError(e)
    })?;

    Ok(())
}

async fn reload(state: &AppState, authed: &AuthedStudent) -> Result<Json<StudentProfile>, ApiError> {
    load_profile(state, authed).await.map(Json)
}

/// GET /api/students/me/profile
///
/// Returns the saved profile, or a defaulted draft when nothing is saved yet.
pub async fn get_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
) -> Result<Json<StudentProfile>, ApiError> {
    let state = state_lock.read().await.clone();
    reload(&state, &authed).await
}

/// PUT /api/students/me/profile
///
/// # Request Body
/// ```json
/// { "step": 2, "data": { "localAddress": "...", "mobileNo": "9876543210" } }
/// ```
///
/// Validates only the given step, saves the draft and moves to the next step.
pub async fn save_step(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
    payload: Option<Json<UpdateProfileRequest>>,
) -> Result<Json<StudentProfile>, ApiError> {
    let state = state_lock.read().await.clone();
    let Json(request) = payload.unwrap_or_default();

    let (Some(step), Some(update)) = (request.step, request.data) else {
        return Err(ApiError::BadRequest("Step and data are required".to_string()));
    };
    let step = FormStep::from_number(step)
        .ok_or_else(|| ApiError::BadRequest("Step must be between 1 and 5".to_string()))?;

    let mut profile = load_profile(&state, &authed).await?;
    if profile.is_submitted() {
        warn!(account_id = %authed.id, "Edit attempted on submitted profile");
        return Err(ApiError::BadRequest("Profile already submitted".to_string()));
    }

    profile.data.merge(update);

    let today = state.clock.now().date_naive();
    let validation = StepValidator { step, today }.validate(&profile.data);
    if !validation.is_valid() {
        return Err(validation.into());
    }

    profile.current_step = step.next().number();
    save_profile(&state.db, &authed.id, &profile).await?;

    info!(account_id = %authed.id, step = step.number(), "Profile step saved");
    reload(&state, &authed).await
}

/// POST /api/students/me/profile/submit
///
/// Validates every step and locks the profile.
pub async fn submit_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedStudent,
) -> Result<Json<StudentProfile>, ApiError> {
    let state = state_lock.read().await.clone();

    let mut profile = load_profile(&state, &authed).await?;
    if profile.is_submitted() {
        return Err(ApiError::BadRequest("Profile already submitted".to_string()));
    }

    let now = state.clock.now();
    let validation = ProfileValidator {
        today: now.date_naive(),
    }
    .validate(&profile.data);
    if !validation.is_valid() {
        return Err(validation.into());
    }

    profile.status = ProfileStatus::Submitted;
    profile.current_step = FormStep::Review.number();
    profile.submitted_at = Some(now.to_rfc3339());
    save_profile(&state.db, &authed.id, &profile).await?;

    info!(account_id = %authed.id, "Profile submitted");
    reload(&state, &authed).await
}
