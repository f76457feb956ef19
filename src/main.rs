//! Student enrollment intake service.
//!
//! Main entry point for the enrollment server. Loads configuration, opens
//! the database pool and serves the HTTP API until shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use enrollment_api::{spawn_schema_setup, AppState, Config};
use enrollment_core::{Clock, RealClock};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;

    init_tracing(&config.log.filter)?;

    info!("Starting enrollment intake service");
    info!(
        database_url = %config.database.masked_url(),
        host = %config.server.host,
        port = config.server.port,
        max_connections = config.database.max_connections,
        "Configuration loaded"
    );

    let addr = config.server.socket_addr()?;
    let clock: Arc<dyn Clock> = Arc::new(RealClock::new());

    // Connections open on demand; the listener never waits on the database.
    let db_pool = config.database.connect_lazy()?;
    let state = AppState::new(db_pool.clone(), clock);
    let schema_setup = spawn_schema_setup(state.storage.clone());

    info!(%addr, "Enrollment service is ready to accept submissions");

    // Returns once the shutdown signal has drained in-flight requests.
    let served = enrollment_api::start_server(state, addr).await;

    schema_setup.abort();
    db_pool.close().await;
    info!("Database connections closed");

    served.context("HTTP server failed")?;
    info!("Enrollment service shutdown complete");
    Ok(())
}

/// Initializes tracing. `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .context("Invalid log filter")?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
    Ok(())
}
