//! # Auth Module
//!
//! Account activation and sessions:
//! - OTP signup, OTP verification and password set
//! - Login with JWT session tokens
//! - AuthedStudent extractor for protected routes

pub mod activation;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod otp;
pub mod password;
pub mod routes;
pub mod store;


pub use activation::{ActivationError, ActivationService};
pub use extractors::AuthedStudent;
pub use routes::auth_routes;
