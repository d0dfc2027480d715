// src/leave/validators.rs

use chrono::NaiveDate;

use super::models::*;
use crate::common::ValidationResult;

/// Check an application and turn it into a `NewLeave`.
///
/// Days are counted inclusively, so a single-day leave has the same start and
/// end date.
pub fn parse_application(data: &ApplyLeaveRequest) -> Result<NewLeave, ValidationResult> {
    let mut result = ValidationResult::new();

    let leave_type = match non_blank(&data.leave_type) {
        None => {
            result.add_error("leaveType", "Leave type is required");
            None
        }
        Some(raw) => {
            let parsed = LeaveType::parse(raw);
            result.check(
                parsed.is_some(),
                "leaveType",
                "Leave type must be one of CL, DL, LWP",
            );
            parsed
        }
    };

    let start_date = parse_date(&mut result, "startDate", "Start date", &data.start_date);
    let end_date = parse_date(&mut result, "endDate", "End date", &data.end_date);
    if let (Some(start), Some(end)) = (start_date, end_date) {
        result.check(end >= start, "endDate", "End date must be on or after start date");
    }

    let reason = non_blank(&data.reason).unwrap_or("");
    if reason.is_empty() {
        result.add_error("reason", "Reason is required");
    } else if reason.chars().count() > MAX_REASON_LEN {
        result.add_error("reason", "Reason must be less than 1000 characters");
    }

    let documents: Vec<String> = data
        .documents
        .iter()
        .flatten()
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    if leave_type == Some(LeaveType::DL) {
        result.check(
            !documents.is_empty(),
            "documents",
            "Supporting documents are required for Duty Leave",
        );
    }

    match (leave_type, start_date, end_date) {
        (Some(leave_type), Some(start_date), Some(end_date)) if result.is_valid() => Ok(NewLeave {
            leave_type,
            start_date,
            end_date,
            days: inclusive_days(start_date, end_date),
            reason: reason.to_string(),
            documents,
        }),
        _ => Err(result),
    }
}

pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

fn parse_date(
    result: &mut ValidationResult,
    field: &str,
    label: &str,
    value: &Option<String>,
) -> Option<NaiveDate> {
    let Some(raw) = non_blank(value) else {
        result.add_error(field, &format!("{} is required", label));
        return None;
    };
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            result.add_error(field, &format!("{} must be in YYYY-MM-DD format", label));
            None
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
