// Common validation types and traits

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Collected field errors for one request.
///
/// Errors for the same field replace each other, so the last rule that fails
/// wins, as in the student form where a format check overrides "is required".
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        if let Some(existing) = self.errors.iter_mut().find(|e| e.field == field) {
            existing.message = message.to_string();
            return;
        }
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    /// Record `message` against `field` when the value is missing or blank.
    pub fn require(&mut self, field: &str, value: Option<&str>, message: &str) {
        if value.map_or(true, |v| v.trim().is_empty()) {
            self.add_error(field, message);
        }
    }

    /// Record `message` against `field` unless `ok` holds.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(&error.field, &error.message);
        }
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// "field: message, field: message" for the `{error}` response body
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}
