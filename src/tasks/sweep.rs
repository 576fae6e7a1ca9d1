//! Periodic Sweep Task
//!
//! Background task that periodically runs the gated runtime cache eviction.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::worker::{CacheManager, EvictionOutcome};

/// Spawns a background task that periodically calls `evict_expired`.
///
/// The 24-hour gate and 30-day sentinel still apply, so a short interval
/// only makes the checks more frequent, never the sweeps.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sweep_task(manager.clone(), Duration::from_secs(86_400));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sweep_task(manager: CacheManager, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting periodic sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match manager.evict_expired().await {
                EvictionOutcome::Swept { removed } => {
                    info!("Periodic sweep: removed {} expired entries", removed);
                }
                outcome => {
                    debug!(?outcome, "Periodic sweep: nothing to do");
                }
            }
        }
    })
}
