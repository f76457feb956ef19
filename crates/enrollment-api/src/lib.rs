//! Enrollment intake HTTP API.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use enrollment_core::{
    storage::Storage, Clock, IntakeService, PostgresStudentStore, RealClock, StudentStore,
};
use sqlx::PgPool;

pub mod config;
pub mod handlers;
pub mod server;
pub mod startup;

pub use config::Config;
pub use server::{create_router, create_router_with_state, start_server};
pub use startup::spawn_schema_setup;

/// Shared state handed to every handler.
///
/// Built once at startup. Cloning is cheap; all members are reference
/// counted.
#[derive(Clone)]
pub struct AppState {
    /// Repository access, used by the readiness check
    pub storage: Storage,
    /// Validation and persistence of submissions
    pub intake: IntakeService,
    /// Time source for health reports
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Creates state writing student records to PostgreSQL through `db`.
    pub fn new(db: PgPool, clock: Arc<dyn Clock>) -> Self {
        let storage = Storage::new(db, &clock);
        let store = Arc::new(PostgresStudentStore::new(Arc::new(storage.clone())));
        Self::from_parts(storage, store, clock)
    }

    /// Creates state with a custom student store.
    ///
    /// `db` still backs the readiness check.
    pub fn with_store(db: PgPool, store: Arc<dyn StudentStore>, clock: Arc<dyn Clock>) -> Self {
        let storage = Storage::new(db, &clock);
        Self::from_parts(storage, store, clock)
    }

    fn from_parts(storage: Storage, store: Arc<dyn StudentStore>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, intake: IntakeService::new(store), clock }
    }
}

impl From<PgPool> for AppState {
    fn from(db: PgPool) -> Self {
        Self::new(db, Arc::new(RealClock::new()))
    }
}
