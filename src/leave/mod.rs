// src/leave/mod.rs
//
// Leave applications: CL (capped per year), DL (with documents) and LWP.

pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::leave_routes;
