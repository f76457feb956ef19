//! Storage seam for the intake service.
//!
//! `StudentStore` is the single operation the intake path needs from a
//! store. Production wraps the PostgreSQL `Storage`. With the `test-util`
//! feature, the in-memory `mock::MockStudentStore` checks write counts and
//! simulates an unreachable store without a database.

use std::{future::Future, pin::Pin, sync::Arc};

use crate::{
    error::Result,
    models::{NewStudent, StudentRecord},
    storage::Storage,
};

/// Store operations required by the intake service.
///
/// Implementations must make each insert atomic per record and must allow
/// concurrent inserts from independent requests.
pub trait StudentStore: Send + Sync + 'static {
    /// Persists a validated student and returns the stored record with its
    /// identifier and timestamps.
    fn insert(
        &self,
        student: NewStudent,
    ) -> Pin<Box<dyn Future<Output = Result<StudentRecord>> + Send + '_>>;
}

/// Production store implementation using PostgreSQL.
pub struct PostgresStudentStore {
    storage: Arc<Storage>,
}

impl PostgresStudentStore {
    /// Creates a new PostgreSQL store adapter.
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl StudentStore for PostgresStudentStore {
    fn insert(
        &self,
        student: NewStudent,
    ) -> Pin<Box<dyn Future<Output = Result<StudentRecord>> + Send + '_>> {
        let storage = self.storage.clone();
        Box::pin(async move { storage.students.create(&student).await })
    }
}

#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    //! In-memory store for testing the intake path.
    //!
    //! Records every insert and can be told to fail, which stands in for an
    //! unreachable database.

    use std::{future::Future, pin::Pin, sync::Arc};

    use tokio::sync::RwLock;

    use super::StudentStore;
    use crate::{
        error::{CoreError, Result},
        models::{NewStudent, StudentId, StudentRecord},
        Clock, RealClock,
    };

    /// Mock store keeping records in memory.
    #[derive(Clone)]
    pub struct MockStudentStore {
        records: Arc<RwLock<Vec<StudentRecord>>>,
        attempts: Arc<RwLock<usize>>,
        failure: Arc<RwLock<Option<String>>>,
        clock: Arc<dyn Clock>,
    }

    impl MockStudentStore {
        /// Creates an empty store stamping records with the real clock.
        pub fn new() -> Self {
            Self::with_clock(Arc::new(RealClock::new()))
        }

        /// Creates an empty store stamping records from `clock`.
        pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
            Self {
                records: Arc::new(RwLock::new(Vec::new())),
                attempts: Arc::new(RwLock::new(0)),
                failure: Arc::new(RwLock::new(None)),
                clock,
            }
        }

        /// Makes every following insert fail with `cause` until cleared.
        pub async fn fail_with(&self, cause: impl Into<String>) {
            *self.failure.write().await = Some(cause.into());
        }

        /// Lets inserts succeed again.
        pub async fn clear_failure(&self) {
            *self.failure.write().await = None;
        }

        /// Returns all stored records in insertion order.
        pub async fn records(&self) -> Vec<StudentRecord> {
            self.records.read().await.clone()
        }

        /// Number of successfully stored records.
        pub async fn record_count(&self) -> usize {
            self.records.read().await.len()
        }

        /// Number of inserts attempted, successful or not.
        pub async fn insert_attempts(&self) -> usize {
            *self.attempts.read().await
        }
    }

    impl Default for MockStudentStore {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StudentStore for MockStudentStore {
        fn insert(
            &self,
            student: NewStudent,
        ) -> Pin<Box<dyn Future<Output = Result<StudentRecord>> + Send + '_>> {
            Box::pin(async move {
                *self.attempts.write().await += 1;

                if let Some(cause) = self.failure.read().await.clone() {
                    return Err(CoreError::Database(cause));
                }

                let record =
                    StudentRecord::from_new(StudentId::new(), student, self.clock.now());
                self.records.write().await.push(record.clone());
                Ok(record)
            })
        }
    }
}
