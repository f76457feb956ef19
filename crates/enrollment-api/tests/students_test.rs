//! Integration tests for the student intake endpoint.
//!
//! Drives `POST /api/students` through the full router with an in-memory
//! store, so write counts and store failures can be observed directly.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Request, StatusCode},
    response::Response,
    Router,
};
use enrollment_api::{create_router_with_state, AppState};
use enrollment_core::{Clock, NewStudent, StudentRecord, StudentStore};
use enrollment_testing::{
    mock_router, unreachable_pool, unreachable_router, MockStudentStore, SubmissionBuilder,
    TestClock,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

fn post_students(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/students")
        .header(CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("request build")
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("request execution");
    let status = response.status();
    (status, body_json(response).await)
}

async fn body_json(response: Response) -> Value {
    let body =
        axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body extraction");
    serde_json::from_slice(&body).expect("json deserialization")
}

/// Holds every insert for `delay` before writing to `inner`.
struct SlowStore {
    inner: MockStudentStore,
    delay: Duration,
}

impl StudentStore for SlowStore {
    fn insert(
        &self,
        student: NewStudent,
    ) -> Pin<Box<dyn Future<Output = enrollment_core::Result<StudentRecord>> + Send + '_>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.inner.insert(student).await
        })
    }
}

#[tokio::test]
async fn valid_submission_is_stored_and_echoed() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");

    let (status, body) =
        send(app, post_students(SubmissionBuilder::with_defaults().body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Student data saved successfully");

    let data = &body["data"];
    assert_eq!(data["name"], "Asha Rao");
    assert_eq!(data["address"], "12 Lake Rd");
    assert_eq!(data["classAppearingFor"], "5");
    assert_eq!(data["previousSchool"], "Green Valley");
    assert_eq!(data["mobileNumber"], "9876543210");
    assert_eq!(data["createdAt"], data["updatedAt"]);

    let id = data["id"].as_str().expect("id should be a string");
    assert!(Uuid::parse_str(id).is_ok(), "id should be a UUID, got {id}");

    assert_eq!(store.record_count().await, 1);
    assert_eq!(store.records().await[0].id.to_string(), id);
}

#[tokio::test]
async fn stored_fields_are_trimmed() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");
    let body = SubmissionBuilder::with_defaults().name("  Asha Rao  ").mobile_number(" 9876543210 ");

    let (status, json) = send(app, post_students(body.body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["name"], "Asha Rao");
    assert_eq!(json["data"]["mobileNumber"], "9876543210");
}

#[tokio::test]
async fn empty_object_lists_every_required_field() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");

    let (status, body) = send(app, post_students("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    insta::assert_json_snapshot!(body, @r###"
    {
      "errors": [
        {
          "field": "name",
          "message": "Name is required"
        },
        {
          "field": "address",
          "message": "Address is required"
        },
        {
          "field": "classAppearingFor",
          "message": "Class is required"
        },
        {
          "field": "previousSchool",
          "message": "Previous School is required"
        },
        {
          "field": "mobileNumber",
          "message": "Mobile Number is required"
        }
      ]
    }
    "###);

    assert_eq!(store.insert_attempts().await, 0);
}

#[tokio::test]
async fn malformed_mobile_number_is_rejected_without_write() {
    let store = MockStudentStore::new();

    for number in ["12345", "98765432101", "98765abcde", "+919876543"] {
        let app = mock_router(store.clone()).expect("router");
        let body = SubmissionBuilder::with_defaults().mobile_number(number).body();

        let (status, json) = send(app, post_students(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "number {number:?}");
        assert_eq!(
            json,
            json!({
                "errors": [{
                    "field": "mobileNumber",
                    "message": "Mobile Number must be a valid 10-digit number"
                }]
            })
        );
    }

    assert_eq!(store.insert_attempts().await, 0);
}

#[tokio::test]
async fn violations_are_reported_together_in_field_order() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");
    let body = SubmissionBuilder::with_defaults()
        .mobile_number("123")
        .previous_school("   ")
        .without("name");

    let (status, json) = send(app, post_students(body.body())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["errors"]
        .as_array()
        .expect("errors array")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["name", "previousSchool", "mobileNumber"]);
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");
    let body = SubmissionBuilder::with_defaults().field("email", "asha@example.com");

    let (status, json) = send(app, post_students(body.body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(json["data"].get("email").is_none());
}

#[tokio::test]
async fn numeric_mobile_number_is_read_as_text() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");
    let body = SubmissionBuilder::with_defaults().mobile_number(9_876_543_210_u64);

    let (status, json) = send(app, post_students(body.body())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["mobileNumber"], "9876543210");
}

#[tokio::test]
async fn unreadable_body_is_reported_as_body_violation() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");

    let (status, json) = send(app, post_students(r#"{"name": "Asha"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "body");
    assert!(json["errors"][0]["message"].as_str().is_some_and(|m| !m.is_empty()));
    assert_eq!(store.insert_attempts().await, 0);
}

#[tokio::test]
async fn missing_content_type_is_a_bad_request() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");
    let request = Request::builder()
        .method("POST")
        .uri("/api/students")
        .body(Body::from(SubmissionBuilder::with_defaults().body()))
        .expect("request build");

    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"][0]["field"], "body");
    assert_eq!(store.insert_attempts().await, 0);
}

#[tokio::test]
async fn store_failure_returns_server_error() {
    let store = MockStudentStore::new();
    store.fail_with("connection refused").await;
    let app = mock_router(store.clone()).expect("router");

    let (status, json) = send(app, post_students(SubmissionBuilder::with_defaults().body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Server error");
    assert_eq!(json["error"], "Database error: connection refused");
    assert_eq!(store.insert_attempts().await, 1);
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn store_recovers_after_failure_clears() {
    let store = MockStudentStore::new();
    store.fail_with("connection refused").await;

    let app = mock_router(store.clone()).expect("router");
    let (status, _) = send(app, post_students(SubmissionBuilder::with_defaults().body())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    store.clear_failure().await;

    let app = mock_router(store.clone()).expect("router");
    let (status, _) = send(app, post_students(SubmissionBuilder::with_defaults().body())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(store.record_count().await, 1);
}

#[tokio::test]
async fn identical_submissions_create_distinct_records() {
    let store = MockStudentStore::new();
    let body = SubmissionBuilder::with_defaults().body();

    let first = send(mock_router(store.clone()).expect("router"), post_students(body.clone())).await;
    let second = send(mock_router(store.clone()).expect("router"), post_students(body)).await;

    assert_eq!(first.0, StatusCode::CREATED);
    assert_eq!(second.0, StatusCode::CREATED);
    assert_ne!(first.1["data"]["id"], second.1["data"]["id"]);
    assert_eq!(store.record_count().await, 2);
}

#[tokio::test]
async fn concurrent_submissions_are_all_stored() {
    let store = MockStudentStore::new();
    let app = mock_router(store.clone()).expect("router");

    let requests = (0..8).map(|i| {
        let app = app.clone();
        let body = SubmissionBuilder::with_defaults().name(format!("Student {i}")).body();
        async move { send(app, post_students(body)).await.0 }
    });

    let statuses = futures::future::join_all(requests).await;

    assert!(statuses.iter().all(|s| *s == StatusCode::CREATED));
    assert_eq!(store.record_count().await, 8);
}

#[tokio::test]
async fn slow_write_is_answered_with_the_stored_record() {
    let store = MockStudentStore::new();
    let slow = SlowStore { inner: store.clone(), delay: Duration::from_millis(300) };
    let clock: Arc<dyn Clock> = Arc::new(TestClock::new());
    let state = AppState::with_store(unreachable_pool().expect("pool"), Arc::new(slow), clock);
    let app = create_router_with_state(state);

    let response = app
        .oneshot(post_students(SubmissionBuilder::with_defaults().body()))
        .await
        .expect("request execution");

    assert_eq!(response.status(), StatusCode::CREATED);
    let content_type = response.headers().get(CONTENT_TYPE).cloned();
    assert_eq!(content_type.as_ref().and_then(|v| v.to_str().ok()), Some("application/json"));

    let body = body_json(response).await;
    assert_eq!(store.record_count().await, 1);
    assert_eq!(body["data"]["id"], store.records().await[0].id.to_string());
}

#[tokio::test]
async fn unreachable_database_returns_server_error() {
    let app = unreachable_router().expect("router");

    let (status, json) = send(app, post_students(SubmissionBuilder::with_defaults().body())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["message"], "Server error");
    assert!(json["error"].as_str().is_some_and(|e| !e.is_empty()));
}

#[tokio::test]
async fn invalid_submission_is_rejected_even_when_database_is_down() {
    let app = unreachable_router().expect("router");

    let (status, json) = send(app, post_students("{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["errors"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = mock_router(MockStudentStore::new()).expect("router");
    let request = Request::builder()
        .method("POST")
        .uri("/api/students")
        .header(CONTENT_TYPE, "application/json")
        .header("Origin", "http://localhost:3000")
        .body(Body::from(SubmissionBuilder::with_defaults().body()))
        .expect("request build");

    let response = app.oneshot(request).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers().get("access-control-allow-origin").and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = mock_router(MockStudentStore::new()).expect("router");
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/students")
        .header("Origin", "http://localhost:3000")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .expect("request build");

    let response = app.oneshot(request).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn get_on_intake_route_is_not_allowed() {
    let app = mock_router(MockStudentStore::new()).expect("router");
    let request =
        Request::builder().uri("/api/students").body(Body::empty()).expect("request build");

    let response = app.oneshot(request).await.expect("request execution");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
