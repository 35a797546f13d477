//! TTL Cleanup Task
//!
//! Background task that periodically removes expired studies, so stale
//! entries stop counting against the size budget before anyone reads them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::service::ImagingCacheService;

/// Spawns a background task that periodically purges expired studies.
///
/// The task loops forever, sleeping `cleanup_interval_secs` between sweeps.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(service.clone(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(
    service: ImagingCacheService,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = service.purge_expired().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired studies", removed);
            } else {
                debug!("TTL cleanup: no expired studies found");
            }
        }
    })
}
