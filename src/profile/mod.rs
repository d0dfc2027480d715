// src/profile/mod.rs
//
// Multi-step student profile: draft saves per step, then a final submission.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::profile_routes;
