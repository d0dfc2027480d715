// src/leave/services.rs

use chrono::{Datelike, NaiveDate};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::*;
use super::validators::parse_application;
use crate::common::{generate_leave_id, ApiError, Clock, ValidationResult};

#[derive(Debug, Error)]
pub enum LeaveError {
    #[error("{}", .0.summary())]
    Invalid(ValidationResult),

    #[error("Casual leave quota exceeded: {remaining} of {quota} days left this year. Please apply for LWP instead")]
    CasualQuotaExceeded { remaining: i64, quota: i64 },

    #[error("stored leave application {id} is malformed: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LeaveError> for ApiError {
    fn from(err: LeaveError) -> Self {
        match err {
            LeaveError::Invalid(result) => result.into(),
            e @ LeaveError::CasualQuotaExceeded { .. } => ApiError::BadRequest(e.to_string()),
            e @ LeaveError::Corrupt { .. } => {
                error!(error = %e, "Corrupt leave application row");
                ApiError::InternalServer("Failed to load leave applications".to_string())
            }
            LeaveError::Database(e) => ApiError::DatabaseError(e),
        }
    }
}

impl TryFrom<LeaveApplicationRow> for LeaveApplication {
    type Error = LeaveError;

    fn try_from(row: LeaveApplicationRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: &str| LeaveError::Corrupt {
            id: row.id.clone(),
            reason: reason.to_string(),
        };

        let leave_type = LeaveType::parse(&row.leave_type).ok_or_else(|| corrupt("leave type"))?;
        let status = LeaveStatus::parse(&row.status).ok_or_else(|| corrupt("status"))?;
        let start_date = NaiveDate::parse_from_str(&row.start_date, "%Y-%m-%d")
            .map_err(|_| corrupt("start date"))?;
        let end_date = NaiveDate::parse_from_str(&row.end_date, "%Y-%m-%d")
            .map_err(|_| corrupt("end date"))?;
        let documents: Vec<String> =
            serde_json::from_str(&row.documents).map_err(|_| corrupt("documents"))?;

        Ok(LeaveApplication {
            id: row.id,
            leave_type,
            start_date,
            end_date,
            days: row.days,
            reason: row.reason,
            documents,
            status,
            applied_date: row.applied_at,
        })
    }
}

// ============================================================================
// Usage Rules
// ============================================================================

/// Days of `leave_type` used in `year`, by start date, ignoring rejected
/// applications
pub fn days_used(applications: &[LeaveApplication], leave_type: LeaveType, year: i32) -> i64 {
    applications
        .iter()
        .filter(|a| a.leave_type == leave_type)
        .filter(|a| a.status.counts_toward_usage())
        .filter(|a| a.start_date.year() == year)
        .map(|a| a.days)
        .sum()
}

/// Reject casual leave that would go past the yearly quota
pub fn check_casual_quota(existing: &[LeaveApplication], leave: &NewLeave) -> Result<(), LeaveError> {
    if leave.leave_type != LeaveType::CL {
        return Ok(());
    }
    let used = days_used(existing, LeaveType::CL, leave.start_date.year());
    if used + leave.days > CL_QUOTA_DAYS {
        return Err(LeaveError::CasualQuotaExceeded {
            remaining: (CL_QUOTA_DAYS - used).max(0),
            quota: CL_QUOTA_DAYS,
        });
    }
    Ok(())
}

/// Apply the list screen's filters. "All Status"/"All Types" mean no filter,
/// and a type filter like "CL (Casual Leave)" matches on its first word.
pub fn filter_applications(
    applications: Vec<LeaveApplication>,
    query: &LeaveQuery,
) -> Vec<LeaveApplication> {
    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "All Status");
    let leave_type = query
        .leave_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty() && *t != "All Types")
        .map(|t| t.split_whitespace().next().unwrap_or(t));
    let search = query
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    applications
        .into_iter()
        .filter(|a| status.map_or(true, |s| a.status.as_str() == s))
        .filter(|a| leave_type.map_or(true, |t| a.leave_type.as_str() == t))
        .filter(|a| {
            search.as_deref().map_or(true, |s| {
                a.reason.to_lowercase().contains(s) || a.leave_type.as_str().to_lowercase().contains(s)
            })
        })
        .collect()
}

pub fn summarize(applications: &[LeaveApplication], year: i32) -> LeaveSummary {
    let lwp_used = days_used(applications, LeaveType::LWP, year);
    LeaveSummary {
        total_applications: applications.len() as i64,
        cl_used: days_used(applications, LeaveType::CL, year),
        cl_quota: CL_QUOTA_DAYS,
        dl_used: days_used(applications, LeaveType::DL, year),
        lwp_used,
        lwp_deduction: lwp_used * LWP_DEDUCTION_PER_DAY,
    }
}

// ============================================================================
// Leave Service
// ============================================================================

pub struct LeaveService {
    db: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl LeaveService {
    pub fn new(db: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// All applications of a student, newest first
    pub async fn list_for_account(&self, account_id: &str) -> Result<Vec<LeaveApplication>, LeaveError> {
        let rows = sqlx::query_as::<_, LeaveApplicationRow>(
            r#"
            SELECT * FROM leave_applications
            WHERE account_id = ?
            ORDER BY applied_at DESC, rowid DESC
            "#,
        )
        .bind(account_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(LeaveApplication::try_from).collect()
    }

    /// Validate and store a new application in `Pending Review`
    pub async fn apply(
        &self,
        account_id: &str,
        request: &ApplyLeaveRequest,
    ) -> Result<LeaveApplication, LeaveError> {
        let leave = parse_application(request).map_err(LeaveError::Invalid)?;

        // quota check and insert see the same rows
        let mut tx = self.db.begin().await?;

        let rows = sqlx::query_as::<_, LeaveApplicationRow>(
            "SELECT * FROM leave_applications WHERE account_id = ? AND leave_type = ?",
        )
        .bind(account_id)
        .bind(leave.leave_type.as_str())
        .fetch_all(&mut *tx)
        .await?;
        let existing = rows
            .into_iter()
            .map(LeaveApplication::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(e) = check_casual_quota(&existing, &leave) {
            warn!(account_id = %account_id, days = leave.days, "Casual leave quota exceeded");
            return Err(e);
        }

        let documents = serde_json::to_string(&leave.documents).map_err(|e| LeaveError::Corrupt {
            id: "new".to_string(),
            reason: e.to_string(),
        })?;
        let id = generate_leave_id();
        let applied_at = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO leave_applications
                (id, account_id, leave_type, start_date, end_date, days, reason, documents, status, applied_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(account_id)
        .bind(leave.leave_type.as_str())
        .bind(leave.start_date.format("%Y-%m-%d").to_string())
        .bind(leave.end_date.format("%Y-%m-%d").to_string())
        .bind(leave.days)
        .bind(&leave.reason)
        .bind(documents)
        .bind(LeaveStatus::PendingReview.as_str())
        .bind(&applied_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            account_id = %account_id,
            leave_id = %id,
            leave_type = leave.leave_type.as_str(),
            days = leave.days,
            "Leave application submitted"
        );

        Ok(LeaveApplication {
            id,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            days: leave.days,
            reason: leave.reason,
            documents: leave.documents,
            status: LeaveStatus::PendingReview,
            applied_date: applied_at,
        })
    }

    pub async fn summary(&self, account_id: &str) -> Result<LeaveSummary, LeaveError> {
        let applications = self.list_for_account(account_id).await?;
        Ok(summarize(&applications, self.clock.now().year()))
    }
}
