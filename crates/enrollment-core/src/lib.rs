//! Core domain types for student enrollment intake.
//!
//! Provides the student record model, field validation rules, the error
//! taxonomy, the clock abstraction, PostgreSQL repositories and the intake
//! service that ties validation to persistence. The HTTP layer and test
//! infrastructure build on these types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod intake;
pub mod models;
pub mod storage;
pub mod time;
pub mod validation;

pub use error::{CoreError, IntakeError, Result};
pub use intake::{
    store::{PostgresStudentStore, StudentStore},
    IntakeService,
};
pub use models::{NewStudent, StudentId, StudentRecord, StudentSubmission};
pub use time::{Clock, RealClock, TestClock};
pub use validation::{validate, FieldViolation, ValidationErrors};
