//! HTTP request handlers for the enrollment API.
//!
//! - `students` - record intake (`POST /api/students`)
//! - `health` - liveness (`GET /`) and readiness (`GET /health`)
//!
//! Intake responses follow two error shapes: a list of field violations
//! for `400`, and a generic message plus cause for `500`.

pub mod health;
pub mod students;

pub use health::{health_check, liveness_check};
pub use students::create_student;
