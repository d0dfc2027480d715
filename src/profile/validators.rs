// src/profile/validators.rs

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use super::models::*;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Student Profile Validators
// ============================================================================

/// Checks the fields that belong to one page of the form
pub struct StepValidator {
    pub step: FormStep,
    /// Birth dates after this day are rejected
    pub today: NaiveDate,
}

impl Validator<StudentProfileData> for StepValidator {
    fn validate(&self, data: &StudentProfileData) -> ValidationResult {
        match self.step {
            FormStep::Personal => validate_personal(data, self.today),
            FormStep::Contact => validate_contact(data),
            FormStep::Academic => validate_academic(data),
            FormStep::Documents => validate_documents(data),
            FormStep::Review => ValidationResult::new(),
        }
    }
}

/// Checks every step, used before final submission
pub struct ProfileValidator {
    pub today: NaiveDate,
}

impl Validator<StudentProfileData> for ProfileValidator {
    fn validate(&self, data: &StudentProfileData) -> ValidationResult {
        let mut result = ValidationResult::new();
        for step in FormStep::ALL {
            result.merge(StepValidator { step, today: self.today }.validate(data));
        }
        result
    }
}

fn validate_personal(data: &StudentProfileData, today: NaiveDate) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.require("studentId", data.student_id.as_deref(), "Student ID is required");
    result.require("studentName", data.student_name.as_deref(), "Student name is required");

    match non_blank(&data.birth_date) {
        None => result.add_error("birthDate", "Birth date is required"),
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Err(_) => result.add_error("birthDate", "Birth date must be in YYYY-MM-DD format"),
            Ok(date) if date > today => {
                result.add_error("birthDate", "Birth date cannot be in the future")
            }
            Ok(_) => {}
        },
    }

    result
}

fn validate_contact(data: &StudentProfileData) -> ValidationResult {
    let mut result = ValidationResult::new();

    result.require("localAddress", data.local_address.as_deref(), "Local address is required");
    result.require(
        "permanentAddress",
        data.permanent_address.as_deref(),
        "Permanent address is required",
    );

    // Format errors replace the "required" message, as the form shows them
    result.require("mobileNo", data.mobile_no.as_deref(), "Mobile number is required");
    result.check(
        is_mobile_number(data.mobile_no.as_deref().unwrap_or("")),
        "mobileNo",
        "Mobile number must be 10 digits",
    );

    result.require("personalEmail", data.personal_email.as_deref(), "Personal email is required");
    result.check(
        is_loose_email(data.personal_email.as_deref().unwrap_or("")),
        "personalEmail",
        "Personal email is invalid",
    );

    result.require(
        "institutionalEmail",
        data.institutional_email.as_deref(),
        "Institutional email is required",
    );
    result.check(
        is_loose_email(data.institutional_email.as_deref().unwrap_or("")),
        "institutionalEmail",
        "Institutional email is invalid",
    );

    if let Some(mobile) = non_blank(&data.guardian_mobile_no) {
        result.check(
            is_mobile_number(mobile),
            "guardianMobileNo",
            "Guardian mobile number must be 10 digits",
        );
    }
    if let Some(email) = non_blank(&data.guardian_email) {
        result.check(is_loose_email(email), "guardianEmail", "Guardian email is invalid");
    }

    result
}

fn validate_academic(data: &StudentProfileData) -> ValidationResult {
    let mut result = ValidationResult::new();

    if data.is_handicapped.unwrap_or(false) {
        result.require("disability", data.disability.as_deref(), "Disability details are required");
    }

    result
}

fn validate_documents(data: &StudentProfileData) -> ValidationResult {
    let mut result = ValidationResult::new();

    match non_blank(&data.aadhaar_number) {
        None => result.add_error("aadhaarNumber", "Aadhaar Number is required"),
        Some(aadhaar) => result.check(
            is_aadhaar(aadhaar),
            "aadhaarNumber",
            "Aadhaar Number must be 12 digits",
        ),
    }

    match non_blank(&data.pancard_number) {
        None => result.add_error("pancardNumber", "Pancard Number is required"),
        Some(pan) => result.check(is_pan(pan), "pancardNumber", "Pancard Number is invalid"),
    }

    result
}

// ============================================================================
// Helpers
// ============================================================================

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn all_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn is_mobile_number(value: &str) -> bool {
    all_digits(value, 10)
}

fn is_aadhaar(value: &str) -> bool {
    all_digits(value, 12)
}

fn is_pan(value: &str) -> bool {
    static PAN: OnceLock<Option<Regex>> = OnceLock::new();
    PAN.get_or_init(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

/// Same looseness as the form's `\S+@\S+\.\S+` check
fn is_loose_email(value: &str) -> bool {
    static LOOSE: OnceLock<Option<Regex>> = OnceLock::new();
    LOOSE
        .get_or_init(|| Regex::new(r"\S+@\S+\.\S+").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}
