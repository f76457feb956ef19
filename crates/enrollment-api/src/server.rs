//! Router assembly and the HTTP listener.
//!
//! Middleware, outermost first: request id assignment, request tracing,
//! request id propagation to the response, permissive CORS, and panic
//! recovery closest to the handlers.
//!
//! There is no router-level request timeout. A write that has started is
//! never abandoned mid-flight; store waits are bounded by the pool's
//! acquire timeout instead.

use std::{any::Any, net::SocketAddr};

use axum::{
    response::Response,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tokio::{net::TcpListener, signal};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

use crate::{handlers, AppState};

/// Router writing to PostgreSQL through `db`, stamped by the system clock.
///
/// ```no_run
/// use enrollment_api::create_router;
///
/// # async fn run(db: sqlx::PgPool) -> std::io::Result<()> {
/// let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
/// axum::serve(listener, create_router(db)).await
/// # }
/// ```
pub fn create_router(db: PgPool) -> Router {
    create_router_with_state(AppState::from(db))
}

/// Router over prepared application state.
pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::liveness_check))
        .route("/health", get(handlers::health_check))
        .route("/api/students", post(handlers::create_student))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| payload.downcast_ref::<&str>().copied())
        .unwrap_or("handler panicked");

    error!(panic = %detail, "Request handler panicked");
    handlers::students::persistence_failure_response(detail)
}

/// Binds `addr` and serves until Ctrl+C or SIGTERM.
///
/// In-flight requests are drained before this returns.
///
/// # Errors
///
/// Returns `std::io::Error` if the address cannot be bound.
pub async fn start_server(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening for HTTP requests");

    axum::serve(listener, create_router_with_state(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server drained and stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Ctrl+C received, shutting down"),
        () = terminate => info!("SIGTERM received, shutting down"),
    }
}
