//! Store bootstrap that runs beside the HTTP listener.
//!
//! The listener binds before the database has answered once. Schema setup
//! keeps retrying in the background: a few quick attempts first, then a
//! slower steady interval for as long as the store stays away.

use std::time::Duration;

use enrollment_core::storage::Storage;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Attempts made at the short interval before backing off.
pub const QUICK_ATTEMPTS: u32 = 6;

/// Delay between the first attempts.
pub const QUICK_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Delay between attempts once the quick ones are used up.
pub const STEADY_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Starts schema setup on its own task and returns immediately.
///
/// The task finishes once the schema is in place. Intake writes fail with a
/// persistence error until then; liveness is unaffected.
pub fn spawn_schema_setup(storage: Storage) -> JoinHandle<()> {
    tokio::spawn(ensure_schema(storage))
}

async fn ensure_schema(storage: Storage) {
    let mut attempt: u32 = 1;

    loop {
        match storage.run_migrations().await {
            Ok(()) => {
                info!(attempt, "Database reachable, schema ready");
                return;
            },
            Err(e) if attempt < QUICK_ATTEMPTS => {
                warn!(
                    attempt,
                    max_attempts = QUICK_ATTEMPTS,
                    error = %e,
                    "Database not ready, retrying"
                );
                tokio::time::sleep(QUICK_RETRY_DELAY).await;
            },
            Err(e) => {
                if attempt == QUICK_ATTEMPTS {
                    error!(error = %e, "Database still unreachable, serving without it");
                } else {
                    warn!(attempt, error = %e, "Database schema not applied yet");
                }
                tokio::time::sleep(STEADY_RETRY_DELAY).await;
            },
        }
        attempt = attempt.saturating_add(1);
    }
}
