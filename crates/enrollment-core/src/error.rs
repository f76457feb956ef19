//! Error types and result handling for intake operations.
//!
//! Separates store-level failures (`CoreError`) from the two outcomes a
//! submission can fail with (`IntakeError`): caller-fixable validation
//! errors and server-side persistence failures.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Generic message reported to callers when a write does not complete.
pub const PERSISTENCE_FAILURE_MESSAGE: &str = "Server error";

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The store could not be reached or did not hand out a connection.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A row broke a table constraint.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other database failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for CoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            },
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_check_violation() =>
            {
                Self::ConstraintViolation(db_err.to_string())
            },
            _ => Self::Database(err.to_string()),
        }
    }
}

/// Outcome of a failed submission.
///
/// There are exactly two kinds. Anything unexpected that happens while
/// storing a record is reported as `Persistence`.
#[derive(Debug, Error)]
pub enum IntakeError {
    /// One or more field-level violations. The caller can fix the input
    /// and resubmit.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// The store write did not complete.
    #[error("Server error: {cause}")]
    Persistence {
        /// Description of the underlying failure
        cause: String,
    },
}

impl IntakeError {
    /// Wraps any store failure as a persistence failure.
    pub fn persistence(cause: impl std::fmt::Display) -> Self {
        Self::Persistence { cause: cause.to_string() }
    }

    /// Returns the HTTP status code this error maps to.
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Persistence { .. } => 500,
        }
    }

    /// Returns whether the failure is a server-side fault.
    pub const fn is_server_fault(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

impl From<CoreError> for IntakeError {
    fn from(err: CoreError) -> Self {
        Self::persistence(err)
    }
}
