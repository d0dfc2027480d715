// src/services/mod.rs
//
// Shared services used across the auth, profile and leave modules

pub mod email;
pub mod notifier;
pub mod rate_limit;
pub mod ses;

// Re-export commonly used types for convenience
pub use notifier::{LogNotifier, Notifier, NotifyError};
pub use rate_limit::{RateLimitConfig, RateLimitService};
pub use ses::SesNotifier;
