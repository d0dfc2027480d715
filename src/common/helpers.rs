// Helper functions for email handling and safe logging

use regex::Regex;
use std::sync::OnceLock;

/// Masks email addresses for safe logging
///
/// # Example
/// ```ignore
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if email.len() > 3 && !domain.contains('@') => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        _ => "***@***.***".to_string(),
    }
}

/// Normalize an email for lookup and uniqueness checks.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

/// Basic email format check on already-normalized input.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_some_and(|regex| regex.is_match(email))
}

/// True when `email` belongs to `domain` (e.g. "charusat.edu.in").
pub fn email_in_domain(email: &str, domain: &str) -> bool {
    let domain = domain.trim().trim_start_matches('@').to_lowercase();
    email
        .rsplit_once('@')
        .is_some_and(|(_, host)| host.eq_ignore_ascii_case(&domain))
}

/// The part of an email address before the `@`.
pub fn email_local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}
