//! Integration tests for the student repository.
//!
//! Runs the production SQL against a dedicated database per test. Skipped
//! when `DATABASE_URL` is not set.

use std::{sync::Arc, time::Duration};

use enrollment_core::{
    intake::store::PostgresStudentStore, storage::Storage, Clock, IntakeService, NewStudent,
    StudentId, StudentSubmission, TestClock,
};
use enrollment_testing::{require_database, TestEnv};

fn new_student(name: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        address: "12 Lake Rd".to_string(),
        class_appearing_for: "5".to_string(),
        previous_school: "Green Valley".to_string(),
        mobile_number: "9876543210".to_string(),
    }
}

#[tokio::test]
async fn storage_health_check() {
    require_database!();

    let env = TestEnv::new().await.unwrap();

    assert!(env.storage().health_check().await.is_ok());
}

#[tokio::test]
async fn migrations_are_idempotent() {
    require_database!();

    let env = TestEnv::new().await.unwrap();

    env.storage().run_migrations().await.unwrap();
    env.storage().run_migrations().await.unwrap();

    assert_eq!(env.list_tables().await.unwrap(), vec!["students".to_string()]);
}

#[tokio::test]
async fn create_and_find_student() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let repo = &env.storage().students;

    let created = repo.create(&new_student("Asha Rao")).await.unwrap();
    let found = repo.find_by_id(created.id).await.unwrap();

    assert_eq!(found, Some(created.clone()));
    assert_eq!(created.name, "Asha Rao");
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn find_missing_student_returns_none() {
    require_database!();

    let env = TestEnv::new().await.unwrap();

    let found = env.storage().students.find_by_id(StudentId::new()).await.unwrap();

    assert!(found.is_none());
}

#[tokio::test]
async fn duplicate_payloads_get_distinct_ids() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let repo = &env.storage().students;

    let first = repo.create(&new_student("Asha Rao")).await.unwrap();
    let second = repo.create(&new_student("Asha Rao")).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn timestamps_follow_injected_clock() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let repo = &env.storage().students;

    let first = repo.create(&new_student("Asha Rao")).await.unwrap();
    env.clock.advance(Duration::from_secs(86_400));
    let second = repo.create(&new_student("Ravi Kumar")).await.unwrap();

    let gap = second.created_at - first.created_at;
    assert_eq!(gap.num_seconds(), 86_400);
}

#[tokio::test]
async fn create_in_transaction_is_invisible_until_commit() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let repo = &env.storage().students;

    let mut tx = env.pool().begin().await.unwrap();
    let created = repo.create_in_tx(&mut tx, &new_student("Asha Rao")).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 0);

    tx.commit().await.unwrap();

    assert_eq!(repo.find_by_id(created.id).await.unwrap(), Some(created));
}

#[tokio::test]
async fn rolled_back_transaction_leaves_no_record() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let repo = &env.storage().students;

    let mut tx = env.pool().begin().await.unwrap();
    repo.create_in_tx(&mut tx, &new_student("Asha Rao")).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn intake_service_persists_through_postgres() {
    require_database!();

    let env = TestEnv::new().await.unwrap();
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());
    let storage = Arc::new(Storage::new(env.pool().clone(), &clock));
    let service = IntakeService::new(Arc::new(PostgresStudentStore::new(storage)));

    let submission = StudentSubmission {
        name: Some(" Asha Rao ".to_string()),
        address: Some("12 Lake Rd".to_string()),
        class_appearing_for: Some("5".to_string()),
        previous_school: Some("Green Valley".to_string()),
        mobile_number: Some("9876543210".to_string()),
    };

    let record = service.submit(submission).await.unwrap();

    assert_eq!(record.name, "Asha Rao");
    assert_eq!(env.count_students().await.unwrap(), 1);
}
