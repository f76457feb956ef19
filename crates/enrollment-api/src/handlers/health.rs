//! Liveness and readiness endpoints.
//!
//! `GET /` answers as long as the process is serving HTTP, whatever the
//! state of the store. `GET /health` additionally probes the store.

use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use enrollment_core::storage::Storage;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::AppState;

/// Body of the liveness response.
pub const LIVENESS_MESSAGE: &str = "Backend Server is Running";

/// Whether the service can accept submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    /// The store answered the probe
    Ready,
    /// The store could not be reached
    Unavailable,
}

/// Outcome of one store probe.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProbe {
    /// True if the probe query succeeded
    pub reachable: bool,
    /// Wall time spent on the probe
    pub latency_ms: u64,
    /// Failure description when unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness report returned by `GET /health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    /// Overall verdict
    pub status: Readiness,
    /// Store probe details
    pub store: StoreProbe,
    /// When the probe ran
    pub checked_at: DateTime<Utc>,
    /// Crate version serving the request
    pub version: &'static str,
}

impl ReadinessReport {
    /// HTTP status matching the verdict.
    pub fn status_code(&self) -> StatusCode {
        match self.status {
            Readiness::Ready => StatusCode::OK,
            Readiness::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Runs a trivial query against the store and times it.
pub async fn probe_store(storage: &Storage) -> StoreProbe {
    let started = Instant::now();
    let outcome = storage.health_check().await;
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(()) => StoreProbe { reachable: true, latency_ms, error: None },
        Err(e) => {
            warn!(error = %e, "Store probe failed");
            StoreProbe { reachable: false, latency_ms, error: Some(e.to_string()) }
        },
    }
}

/// Readiness handler: `200` when the store answers, `503` otherwise.
#[instrument(name = "readiness_check", skip_all)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let store = probe_store(&state.storage).await;
    let status = if store.reachable { Readiness::Ready } else { Readiness::Unavailable };

    let report = ReadinessReport {
        status,
        store,
        checked_at: state.clock.now(),
        version: env!("CARGO_PKG_VERSION"),
    };

    debug!(status = ?report.status, latency_ms = report.store.latency_ms, "Readiness probed");
    (report.status_code(), Json(report))
}

/// Liveness handler. Touches nothing but the process itself.
pub async fn liveness_check() -> &'static str {
    LIVENESS_MESSAGE
}
