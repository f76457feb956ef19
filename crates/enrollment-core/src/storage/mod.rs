//! Database access layer for student records.
//!
//! The repository translates between domain models and the table schema.
//! All SQL lives under this module.

use std::sync::Arc;

use sqlx::PgPool;

pub mod students;

use crate::{error::Result, Clock};

/// Container for repository instances sharing one connection pool.
///
/// Built once at startup and handed to the HTTP layer; there is no global
/// store handle.
#[derive(Clone)]
pub struct Storage {
    /// Repository for student record operations.
    pub students: Arc<students::Repository>,
}

impl Storage {
    /// Wraps `pool`; record timestamps come from `clock`.
    pub fn new(pool: PgPool, clock: &Arc<dyn Clock>) -> Self {
        let students = students::Repository::new(Arc::new(pool), clock.clone());

        Self { students: Arc::new(students) }
    }

    /// Returns the shared connection pool.
    pub fn pool(&self) -> Arc<PgPool> {
        self.students.pool()
    }

    /// Round-trips `SELECT 1` through the pool.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unavailable` if no connection can be acquired.
    pub async fn health_check(&self) -> Result<()> {
        let _: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&*self.pool()).await?;

        Ok(())
    }

    /// Creates the schema if it does not exist yet.
    ///
    /// Safe to run on every startup.
    ///
    /// # Errors
    ///
    /// Returns error if any DDL statement fails.
    pub async fn run_migrations(&self) -> Result<()> {
        let pool = self.pool();

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS students (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                address TEXT NOT NULL,
                class_appearing_for TEXT NOT NULL,
                previous_school TEXT NOT NULL,
                mobile_number TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            ",
        )
        .execute(&*pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_students_created_at
            ON students(created_at DESC)
            ",
        )
        .execute(&*pool)
        .await?;

        Ok(())
    }
}
