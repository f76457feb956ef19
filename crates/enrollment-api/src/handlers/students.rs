//! Student enrollment intake handler.
//!
//! Accepts a JSON submission, runs it through the intake service, and maps
//! the outcome onto `201`, `400` or `500`.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use enrollment_core::{
    error::PERSISTENCE_FAILURE_MESSAGE, FieldViolation, IntakeError, StudentRecord,
    StudentSubmission, ValidationErrors,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::AppState;

/// Message returned with a stored record.
pub const CREATED_MESSAGE: &str = "Student data saved successfully";

/// Response from a successful submission.
#[derive(Debug, Serialize)]
pub struct CreateStudentResponse {
    /// Confirmation message
    pub message: &'static str,
    /// The stored record
    pub data: StudentRecord,
}

/// Response when the store write fails.
#[derive(Debug, Serialize)]
pub struct PersistenceFailureResponse {
    /// Generic failure message
    pub message: &'static str,
    /// Description of the underlying cause
    pub error: String,
}

/// Stores a student enrollment submission.
///
/// # Errors
///
/// Returns appropriate HTTP status codes:
/// - 400: body is not a JSON object, or one or more fields are invalid
/// - 500: the record could not be stored
#[instrument(name = "create_student", skip_all)]
pub async fn create_student(
    State(state): State<AppState>,
    payload: Result<Json<StudentSubmission>, JsonRejection>,
) -> Response {
    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected unreadable request body");
            let errors =
                ValidationErrors::from(vec![FieldViolation::new("body", rejection.body_text())]);
            return (StatusCode::BAD_REQUEST, Json(errors)).into_response();
        },
    };

    match state.intake.submit(submission).await {
        Ok(record) => {
            info!(student_id = %record.id, "Student enrollment accepted");
            let body = CreateStudentResponse { message: CREATED_MESSAGE, data: record };
            (StatusCode::CREATED, Json(body)).into_response()
        },
        Err(e) => create_error_response(e),
    }
}

/// Maps an intake failure onto its HTTP response.
fn create_error_response(error: IntakeError) -> Response {
    match error {
        IntakeError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
        IntakeError::Persistence { cause } => persistence_failure_response(&cause),
    }
}

/// Builds the `500` response for a write that did not complete.
pub fn persistence_failure_response(cause: &str) -> Response {
    let body = PersistenceFailureResponse {
        message: PERSISTENCE_FAILURE_MESSAGE,
        error: cause.to_string(),
    };

    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
