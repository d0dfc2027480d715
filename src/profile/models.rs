// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Form Steps
// ============================================================================

/// The five pages of the student profile form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormStep {
    Personal = 1,
    Contact = 2,
    Academic = 3,
    Documents = 4,
    Review = 5,
}

impl FormStep {
    pub const ALL: [FormStep; 5] = [
        FormStep::Personal,
        FormStep::Contact,
        FormStep::Academic,
        FormStep::Documents,
        FormStep::Review,
    ];

    pub fn from_number(step: i64) -> Option<Self> {
        match step {
            1 => Some(FormStep::Personal),
            2 => Some(FormStep::Contact),
            3 => Some(FormStep::Academic),
            4 => Some(FormStep::Documents),
            5 => Some(FormStep::Review),
            _ => None,
        }
    }

    pub fn number(self) -> i64 {
        self as i64
    }

    /// Step the form moves to after this one is saved
    pub fn next(self) -> Self {
        Self::from_number(self.number() + 1).unwrap_or(FormStep::Review)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileStatus {
    Draft,
    Submitted,
}

impl ProfileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileStatus::Draft => "draft",
            ProfileStatus::Submitted => "submitted",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw == "submitted" {
            ProfileStatus::Submitted
        } else {
            ProfileStatus::Draft
        }
    }
}

// ============================================================================
// Profile Data
// ============================================================================

/// Everything the student fills in. All fields are optional so drafts can be
/// saved one step at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfileData {
    // Personal
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub institute: Option<String>,
    pub admission_date: Option<String>,
    pub registration_date: Option<String>,
    pub admission_year: Option<String>,
    pub current_semester: Option<String>,
    pub gender: Option<String>,
    pub birth_date: Option<String>,
    pub admission_cast_category: Option<String>,
    pub actual_cast_category: Option<String>,
    pub nationality: Option<String>,

    // Contact
    pub local_address: Option<String>,
    pub permanent_address: Option<String>,
    pub country: Option<String>,
    pub mobile_no: Option<String>,
    pub guardian_mobile_no: Option<String>,
    pub guardian_email: Option<String>,
    pub personal_email: Option<String>,
    pub institutional_email: Option<String>,

    // Academic
    pub is_handicapped: Option<bool>,
    pub disability: Option<String>,
    pub belongs_to_samaj: Option<bool>,
    pub hostel_name_address: Option<String>,
    pub name_of_guide: Option<String>,
    pub ugc_id: Option<String>,
    pub scholarship_amount: Option<String>,
    pub contingency_amount: Option<String>,
    pub scholarship_type: Option<String>,

    // Documents
    pub aadhaar_number: Option<String>,
    pub pancard_number: Option<String>,
}

macro_rules! overlay {
    ($target:expr, $source:expr, $($field:ident),+ $(,)?) => {
        $(
            if $source.$field.is_some() {
                $target.$field = $source.$field;
            }
        )+
    };
}

impl StudentProfileData {
    /// Blank form for a new student
    pub fn with_defaults(account_email: &str, institute: &str) -> Self {
        Self {
            student_id: Some(crate::common::email_local_part(account_email).to_string()),
            institute: Some(institute.to_string()),
            nationality: Some("Indian".to_string()),
            country: Some("India".to_string()),
            institutional_email: Some(account_email.to_string()),
            is_handicapped: Some(false),
            belongs_to_samaj: Some(false),
            ..Self::default()
        }
    }

    /// Copy every field present in `update` over this draft.
    ///
    /// `studentId` and `institute` are assigned by the portal and are never
    /// taken from the client.
    pub fn merge(&mut self, update: StudentProfileData) {
        overlay!(
            self,
            update,
            student_name,
            admission_date,
            registration_date,
            admission_year,
            current_semester,
            gender,
            birth_date,
            admission_cast_category,
            actual_cast_category,
            nationality,
            local_address,
            permanent_address,
            country,
            mobile_no,
            guardian_mobile_no,
            guardian_email,
            personal_email,
            institutional_email,
            is_handicapped,
            disability,
            belongs_to_samaj,
            hostel_name_address,
            name_of_guide,
            ugc_id,
            scholarship_amount,
            contingency_amount,
            scholarship_type,
            aadhaar_number,
            pancard_number,
        );

        if self.is_handicapped == Some(false) {
            self.disability = None;
        }
    }
}

// ============================================================================
// Storage and API Models
// ============================================================================

#[derive(FromRow, Debug, Clone)]
pub struct StudentProfileRow {
    pub account_id: String,
    pub data: String,
    pub current_step: i64,
    pub status: String,
    pub submitted_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    #[serde(flatten)]
    pub data: StudentProfileData,
    pub current_step: i64,
    pub status: ProfileStatus,
    pub submitted_at: Option<String>,
    pub updated_at: Option<String>,
}

impl StudentProfile {
    pub fn draft(data: StudentProfileData) -> Self {
        Self {
            data,
            current_step: FormStep::Personal.number(),
            status: ProfileStatus::Draft,
            submitted_at: None,
            updated_at: None,
        }
    }

    pub fn from_row(row: StudentProfileRow) -> Result<Self, serde_json::Error> {
        let data = serde_json::from_str(&row.data)?;
        Ok(Self {
            data,
            current_step: row.current_step,
            status: ProfileStatus::parse(&row.status),
            submitted_at: row.submitted_at,
            updated_at: row.updated_at,
        })
    }

    pub fn is_submitted(&self) -> bool {
        self.status == ProfileStatus::Submitted
    }
}

/// PUT /api/students/me/profile
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub step: Option<i64>,
    pub data: Option<StudentProfileData>,
}
