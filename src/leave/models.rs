// src/leave/models.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Casual leave days allowed per calendar year
pub const CL_QUOTA_DAYS: i64 = 30;
/// Stipend deducted per day of leave without pay, in rupees
pub const LWP_DEDUCTION_PER_DAY: i64 = 1000;
pub const MAX_REASON_LEN: usize = 1000;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveType {
    /// Casual Leave, capped per year
    CL,
    /// Duty Leave, needs supporting documents
    DL,
    /// Leave Without Pay
    LWP,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::CL => "CL",
            LeaveType::DL => "DL",
            LeaveType::LWP => "LWP",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "CL" => Some(LeaveType::CL),
            "DL" => Some(LeaveType::DL),
            "LWP" => Some(LeaveType::LWP),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveStatus {
    #[serde(rename = "Pending Review")]
    PendingReview,
    #[serde(rename = "Guide Approved")]
    GuideApproved,
    #[serde(rename = "Operator Approved")]
    OperatorApproved,
    #[serde(rename = "Final Approved")]
    FinalApproved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::PendingReview => "Pending Review",
            LeaveStatus::GuideApproved => "Guide Approved",
            LeaveStatus::OperatorApproved => "Operator Approved",
            LeaveStatus::FinalApproved => "Final Approved",
            LeaveStatus::Rejected => "Rejected",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Pending Review" => Some(LeaveStatus::PendingReview),
            "Guide Approved" => Some(LeaveStatus::GuideApproved),
            "Operator Approved" => Some(LeaveStatus::OperatorApproved),
            "Final Approved" => Some(LeaveStatus::FinalApproved),
            "Rejected" => Some(LeaveStatus::Rejected),
            _ => None,
        }
    }

    /// Rejected applications do not use up any leave
    pub fn counts_toward_usage(&self) -> bool {
        *self != LeaveStatus::Rejected
    }
}

// ============================================================================
// Leave Application Models
// ============================================================================

#[derive(Debug, Clone, FromRow)]
pub struct LeaveApplicationRow {
    pub id: String,
    pub account_id: String,
    pub leave_type: String,
    pub start_date: String,
    pub end_date: String,
    pub days: i64,
    pub reason: String,
    pub documents: String,
    pub status: String,
    pub applied_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveApplication {
    pub id: String,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    pub documents: Vec<String>,
    pub status: LeaveStatus,
    pub applied_date: String,
}

/// Validated application, ready to store
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeave {
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub reason: String,
    pub documents: Vec<String>,
}

/// POST /api/leaves
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyLeaveRequest {
    pub leave_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub reason: Option<String>,
    pub documents: Option<Vec<String>>,
}

/// GET /api/leaves query string
#[derive(Debug, Default, Deserialize)]
pub struct LeaveQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub leave_type: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveSummary {
    pub total_applications: i64,
    pub cl_used: i64,
    pub cl_quota: i64,
    pub dl_used: i64,
    pub lwp_used: i64,
    pub lwp_deduction: i64,
}
