//! Tests for leave module
//!
//! These tests verify:
//! - Application validation and inclusive day counting
//! - The yearly casual leave cap
//! - List filters and the usage summary
//! - The HTTP endpoints

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::test_support::{send_json, TestApp};
    use axum::http::{Method, StatusCode};
    use chrono::NaiveDate;
    use models::*;
    use serde_json::json;
    use services::{check_casual_quota, filter_applications, summarize, LeaveError};
    use validators::{inclusive_days, parse_application};

    const EMAIL: &str = "22dit001@charusat.edu.in";

    fn date(raw: &str) -> NaiveDate {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
    }

    fn request(leave_type: &str, start: &str, end: &str) -> ApplyLeaveRequest {
        ApplyLeaveRequest {
            leave_type: Some(leave_type.to_string()),
            start_date: Some(start.to_string()),
            end_date: Some(end.to_string()),
            reason: Some("Family function".to_string()),
            documents: None,
        }
    }

    fn application(
        leave_type: LeaveType,
        start: &str,
        days: i64,
        status: LeaveStatus,
        reason: &str,
    ) -> LeaveApplication {
        let start_date = date(start);
        LeaveApplication {
            id: format!("L_{}{}", leave_type.as_str(), days),
            leave_type,
            start_date,
            end_date: start_date + chrono::Duration::days(days - 1),
            days,
            reason: reason.to_string(),
            documents: vec![],
            status,
            applied_date: "2025-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn sample() -> Vec<LeaveApplication> {
        vec![
            application(LeaveType::CL, "2025-01-15", 3, LeaveStatus::FinalApproved, "Family emergency"),
            application(LeaveType::DL, "2025-02-20", 3, LeaveStatus::OperatorApproved, "IEEE Conference on AI"),
            application(LeaveType::CL, "2025-03-05", 3, LeaveStatus::GuideApproved, "Wedding ceremony"),
            application(LeaveType::LWP, "2025-07-25", 1, LeaveStatus::PendingReview, "Personal work"),
            application(LeaveType::CL, "2025-06-10", 3, LeaveStatus::Rejected, "Medical checkup"),
            application(LeaveType::CL, "2024-12-01", 5, LeaveStatus::FinalApproved, "Last year"),
        ]
    }

    // ============================================================================
    // Validator Tests
    // ============================================================================

    #[test]
    fn test_days_are_inclusive() {
        assert_eq!(inclusive_days(date("2025-01-15"), date("2025-01-15")), 1);
        assert_eq!(inclusive_days(date("2025-01-15"), date("2025-01-17")), 3);
        assert_eq!(inclusive_days(date("2024-02-28"), date("2024-03-01")), 3);
    }

    #[test]
    fn test_parse_valid_application() {
        let leave = parse_application(&request("cl", "2025-01-15", "2025-01-17")).unwrap();
        assert_eq!(leave.leave_type, LeaveType::CL);
        assert_eq!(leave.days, 3);
        assert_eq!(leave.reason, "Family function");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let result = parse_application(&ApplyLeaveRequest::default()).unwrap_err();
        for field in ["leaveType", "startDate", "endDate", "reason"] {
            assert!(result.has_error(field), "missing {}", field);
        }

        let result = parse_application(&request("SL", "2025-01-17", "2025-01-15")).unwrap_err();
        assert!(result.has_error("leaveType"));
        assert!(result.has_error("endDate"));

        let result = parse_application(&request("CL", "15/01/2025", "2025-01-15")).unwrap_err();
        assert_eq!(result.summary(), "startDate: Start date must be in YYYY-MM-DD format");

        let mut long = request("CL", "2025-01-15", "2025-01-15");
        long.reason = Some("x".repeat(MAX_REASON_LEN + 1));
        assert!(parse_application(&long).unwrap_err().has_error("reason"));
    }

    #[test]
    fn test_duty_leave_needs_documents() {
        let mut req = request("DL", "2025-02-20", "2025-02-22");
        req.documents = Some(vec!["  ".to_string()]);
        let result = parse_application(&req).unwrap_err();
        assert_eq!(
            result.summary(),
            "documents: Supporting documents are required for Duty Leave"
        );

        req.documents = Some(vec!["invitation.pdf".to_string()]);
        let leave = parse_application(&req).unwrap();
        assert_eq!(leave.documents, vec!["invitation.pdf".to_string()]);
    }

    // ============================================================================
    // Usage Rule Tests
    // ============================================================================

    #[test]
    fn test_casual_quota() {
        let existing = sample();
        // 6 CL days used in 2025; rejected and last year's leave don't count
        let fits = parse_application(&request("CL", "2025-08-01", "2025-08-24")).unwrap();
        assert_eq!(fits.days, 24);
        assert!(check_casual_quota(&existing, &fits).is_ok());

        let too_long = parse_application(&request("CL", "2025-08-01", "2025-08-25")).unwrap();
        match check_casual_quota(&existing, &too_long) {
            Err(LeaveError::CasualQuotaExceeded { remaining, quota }) => {
                assert_eq!(remaining, 24);
                assert_eq!(quota, 30);
            }
            other => panic!("expected quota error, got {:?}", other),
        }

        // LWP is never capped
        let lwp = parse_application(&request("LWP", "2025-08-01", "2025-09-30")).unwrap();
        assert!(check_casual_quota(&existing, &lwp).is_ok());
    }

    #[test]
    fn test_filters() {
        let query = |status: Option<&str>, leave_type: Option<&str>, search: Option<&str>| LeaveQuery {
            status: status.map(str::to_string),
            leave_type: leave_type.map(str::to_string),
            search: search.map(str::to_string),
        };

        let all = filter_applications(sample(), &query(Some("All Status"), Some("All Types"), None));
        assert_eq!(all.len(), 6);

        let rejected = filter_applications(sample(), &query(Some("Rejected"), None, None));
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].reason, "Medical checkup");

        let casual = filter_applications(sample(), &query(None, Some("CL (Casual Leave)"), None));
        assert_eq!(casual.len(), 4);

        let search = filter_applications(sample(), &query(None, None, Some("ieee")));
        assert_eq!(search.len(), 1);

        let by_type_text = filter_applications(sample(), &query(None, None, Some("lwp")));
        assert_eq!(by_type_text.len(), 1);
    }

    #[test]
    fn test_summary() {
        let summary = summarize(&sample(), 2025);
        assert_eq!(
            summary,
            LeaveSummary {
                total_applications: 6,
                cl_used: 6,
                cl_quota: 30,
                dl_used: 3,
                lwp_used: 1,
                lwp_deduction: 1000,
            }
        );
    }

    // ============================================================================
    // Handler Tests
    // ============================================================================

    #[tokio::test]
    async fn test_apply_list_and_summary() {
        let app = TestApp::new().await;
        let id = app.verified_account(EMAIL, "pw1").await;
        let token = app.token_for(&id);

        let (status, body) = send_json(
            app.router(),
            Method::POST,
            "/api/leaves",
            Some(json!({
                "leaveType": "CL",
                "startDate": "2025-01-20",
                "endDate": "2025-01-22",
                "reason": "Family emergency"
            })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        assert_eq!(body["days"], 3);
        assert_eq!(body["status"], "Pending Review");
        assert!(body["id"].as_str().unwrap().starts_with("L_"));

        let (status, body) = send_json(
            app.router(),
            Method::POST,
            "/api/leaves",
            Some(json!({
                "leaveType": "DL",
                "startDate": "2025-02-20",
                "endDate": "2025-02-20",
                "reason": "IEEE Conference",
                "documents": ["invitation.pdf"]
            })),
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let (status, body) =
            send_json(app.router(), Method::GET, "/api/leaves", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        // newest first
        assert_eq!(list[0]["leaveType"], "DL");

        let (_, body) = send_json(
            app.router(),
            Method::GET,
            "/api/leaves?type=CL%20(Casual%20Leave)&status=All%20Status",
            None,
            Some(&token),
        )
        .await;
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) =
            send_json(app.router(), Method::GET, "/api/leaves/summary", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "totalApplications": 2,
                "clUsed": 3,
                "clQuota": 30,
                "dlUsed": 1,
                "lwpUsed": 0,
                "lwpDeduction": 0
            })
        );
    }

    #[tokio::test]
    async fn test_casual_quota_over_http() {
        let app = TestApp::new().await;
        let id = app.verified_account(EMAIL, "pw1").await;
        let token = app.token_for(&id);

        let apply = |start: &'static str, end: &'static str| {
            let router = app.router();
            let token = token.clone();
            async move {
                send_json(
                    router,
                    Method::POST,
                    "/api/leaves",
                    Some(json!({ "leaveType": "CL", "startDate": start, "endDate": end, "reason": "Trip" })),
                    Some(&token),
                )
                .await
            }
        };

        let (status, _) = apply("2025-03-01", "2025-03-28").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = apply("2025-04-01", "2025-04-03").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Casual leave quota exceeded: 2 of 30 days left this year. Please apply for LWP instead"
        );

        // the cap is per calendar year of the start date
        let (status, _) = apply("2026-01-05", "2026-01-07").await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_leaves_are_private_and_require_auth() {
        let app = TestApp::new().await;
        let first = app.verified_account(EMAIL, "pw1").await;
        let second = app.verified_account("22dit002@charusat.edu.in", "pw2").await;

        let (status, _) = send_json(
            app.router(),
            Method::POST,
            "/api/leaves",
            Some(json!({
                "leaveType": "LWP",
                "startDate": "2025-01-20",
                "endDate": "2025-01-20",
                "reason": "Personal work"
            })),
            Some(&app.token_for(&first)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (_, body) = send_json(
            app.router(),
            Method::GET,
            "/api/leaves",
            None,
            Some(&app.token_for(&second)),
        )
        .await;
        assert_eq!(body, json!([]));

        let (status, _) = send_json(app.router(), Method::GET, "/api/leaves", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
