// Common module - shared types and utilities across all modules

pub mod clock;
pub mod config;
pub mod error;
pub mod helpers;
pub mod id_generator;
pub mod migrations;
pub mod state;
pub mod validation;

// Re-export commonly used types for convenience
pub use clock::{Clock, SystemClock};
pub use config::AppConfig;
pub use error::ApiError;
pub use helpers::{
    email_in_domain, email_local_part, is_valid_email, normalize_email, safe_email_log,
};
pub use id_generator::*;
pub use state::AppState;
pub use validation::{ValidationResult, Validator};
