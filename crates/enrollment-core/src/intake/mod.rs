//! Intake of enrollment submissions.
//!
//! `IntakeService::submit` is the whole request contract: validate the raw
//! submission, write it once through the injected store, and hand back the
//! stored record or one of the two `IntakeError` kinds.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::{
    error::IntakeError,
    models::{StudentRecord, StudentSubmission},
    validation::validate,
};

pub mod store;

use store::StudentStore;

/// Validates and persists student submissions.
///
/// Holds no per-request state; one instance is shared by all requests.
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn StudentStore>,
}

impl IntakeService {
    /// Creates an intake service writing through `store`.
    pub fn new(store: Arc<dyn StudentStore>) -> Self {
        Self { store }
    }

    /// Validates `submission` and stores it.
    ///
    /// Performs exactly one store write when validation passes and none
    /// when it fails. Failed writes are not retried.
    ///
    /// # Errors
    ///
    /// - `IntakeError::Validation` with every field violation, in field order
    /// - `IntakeError::Persistence` if the write fails for any reason
    #[instrument(name = "submit_student", skip_all)]
    pub async fn submit(
        &self,
        submission: StudentSubmission,
    ) -> Result<StudentRecord, IntakeError> {
        let student = match validate(&submission) {
            Ok(student) => student,
            Err(errors) => {
                debug!(violations = errors.len(), fields = ?errors.fields(), "Submission rejected");
                return Err(IntakeError::Validation(errors));
            },
        };

        // The write runs on its own task: it completes even if the caller goes
        // away, and a panic inside the store comes back as a JoinError.
        let store = self.store.clone();
        let outcome = tokio::spawn(async move { store.insert(student).await }).await;

        match outcome {
            Ok(Ok(record)) => {
                info!(student_id = %record.id, "Student record stored");
                Ok(record)
            },
            Ok(Err(e)) => {
                error!(error = %e, "Failed to store student record");
                Err(IntakeError::from(e))
            },
            Err(e) => {
                error!(error = %e, "Student record write aborted");
                Err(IntakeError::persistence(e))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{store::mock::MockStudentStore, *};
    use crate::{CoreError, NewStudent};

    fn valid_submission() -> StudentSubmission {
        StudentSubmission {
            name: Some("Asha Rao".to_string()),
            address: Some("12 Park Rd".to_string()),
            class_appearing_for: Some("Grade 5".to_string()),
            previous_school: Some("Sunrise School".to_string()),
            mobile_number: Some("9876543210".to_string()),
        }
    }

    struct PanickingStore;

    impl StudentStore for PanickingStore {
        fn insert(
            &self,
            _student: NewStudent,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = crate::Result<StudentRecord>> + Send + '_>,
        > {
            Box::pin(async {
                if true {
                    panic!("driver bug");
                }
                Err::<StudentRecord, CoreError>(CoreError::Database("unreachable".into()))
            })
        }
    }

    #[tokio::test]
    async fn valid_submission_is_written_once() {
        let store = MockStudentStore::new();
        let service = IntakeService::new(Arc::new(store.clone()));

        let record = service.submit(valid_submission()).await.unwrap();

        assert_eq!(record.name, "Asha Rao");
        assert_eq!(store.insert_attempts().await, 1);
        assert_eq!(store.records().await, vec![record]);
    }

    #[tokio::test]
    async fn invalid_submission_is_never_written() {
        let store = MockStudentStore::new();
        let service = IntakeService::new(Arc::new(store.clone()));

        let err = service.submit(StudentSubmission::default()).await.unwrap_err();

        assert!(matches!(err, IntakeError::Validation(ref errors) if errors.len() == 5));
        assert_eq!(store.insert_attempts().await, 0);
    }

    #[tokio::test]
    async fn store_failure_is_reported_without_retry() {
        let store = MockStudentStore::new();
        store.fail_with("connection refused").await;
        let service = IntakeService::new(Arc::new(store.clone()));

        let err = service.submit(valid_submission()).await.unwrap_err();

        match err {
            IntakeError::Persistence { cause } => {
                assert_eq!(cause, CoreError::Database("connection refused".into()).to_string());
            },
            IntakeError::Validation(_) => panic!("expected persistence failure"),
        }
        assert_eq!(store.insert_attempts().await, 1);
        assert_eq!(store.record_count().await, 0);
    }

    #[tokio::test]
    async fn store_panic_becomes_persistence_failure() {
        let service = IntakeService::new(Arc::new(PanickingStore));

        let err = service.submit(valid_submission()).await.unwrap_err();

        assert!(err.is_server_fault());
    }
}
