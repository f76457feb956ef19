//! Repository for student record database operations.
//!
//! Records are insert-only: there is no update or delete path.

use std::sync::Arc;

use sqlx::{Executor, PgPool, Postgres, Transaction};

use crate::{
    error::Result,
    models::{NewStudent, StudentId, StudentRecord},
    Clock,
};

/// Repository for student record database operations.
pub struct Repository {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
}

impl Repository {
    /// Creates a new repository instance.
    pub fn new(pool: Arc<PgPool>, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Returns a reference to the database pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.pool.clone()
    }

    /// Stores a validated student and returns the persisted record.
    ///
    /// Assigns a fresh identifier and stamps `created_at`/`updated_at`.
    /// The write is a single statement, so no partially written record is
    /// ever visible.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails or the pool cannot supply a
    /// connection.
    pub async fn create(&self, student: &NewStudent) -> Result<StudentRecord> {
        self.create_impl(&*self.pool, student).await
    }

    /// Stores a validated student within a transaction.
    ///
    /// # Errors
    ///
    /// Returns error if the insert fails.
    pub async fn create_in_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        student: &NewStudent,
    ) -> Result<StudentRecord> {
        self.create_impl(&mut **tx, student).await
    }

    async fn create_impl<'e, E>(&self, executor: E, student: &NewStudent) -> Result<StudentRecord>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let now = self.clock.now();

        let record = sqlx::query_as::<_, StudentRecord>(
            r"
            INSERT INTO students (
                id, name, address, class_appearing_for, previous_school,
                mobile_number, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING id, name, address, class_appearing_for, previous_school,
                      mobile_number, created_at, updated_at
            ",
        )
        .bind(StudentId::new())
        .bind(&student.name)
        .bind(&student.address)
        .bind(&student.class_appearing_for)
        .bind(&student.previous_school)
        .bind(&student.mobile_number)
        .bind(now)
        .fetch_one(executor)
        .await?;

        Ok(record)
    }

    /// Finds a student record by ID.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn find_by_id(&self, id: StudentId) -> Result<Option<StudentRecord>> {
        let record = sqlx::query_as::<_, StudentRecord>(
            r"
            SELECT id, name, address, class_appearing_for, previous_school,
                   mobile_number, created_at, updated_at
            FROM students
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await?;

        Ok(record)
    }

    /// Counts stored student records.
    ///
    /// # Errors
    ///
    /// Returns error if query fails.
    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&*self.pool)
            .await?;

        Ok(count)
    }
}
