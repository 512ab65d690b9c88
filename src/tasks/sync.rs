//! Background Sync Task
//!
//! Periodically fires pending sync registrations against the worker.
//! Rejected tags stay pending for the next round until they run out of
//! attempts; the final attempt is flagged as the last chance.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::host::SyncRegistry;
use crate::worker::ServiceWorker;

/// Fires every pending tag once.
///
/// Returns the number of tags that completed in this round.
pub async fn run_sync_round(
    worker: &ServiceWorker,
    registry: &SyncRegistry,
    max_attempts: u32,
) -> usize {
    let mut completed = 0;

    for (tag, failures) in registry.pending().await {
        let last_chance = failures + 1 >= max_attempts;

        match worker.dispatch_sync(&tag, last_chance).await {
            Ok(()) => {
                registry.complete(&tag).await;
                completed += 1;
                info!("Sync '{}' completed", tag);
            }
            Err(e) => {
                let attempts = registry.record_failure(&tag).await;
                if attempts >= max_attempts {
                    registry.complete(&tag).await;
                    warn!("Sync '{}' failed {} times, giving up: {}", tag, attempts, e);
                } else {
                    warn!("Sync '{}' failed (attempt {}), will retry: {}", tag, attempts, e);
                }
            }
        }
    }

    completed
}

/// Spawns a background task that fires pending sync tags every interval.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_sync_task(worker.clone(), registry.clone(), 30, 3);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_sync_task(
    worker: ServiceWorker,
    registry: SyncRegistry,
    interval_secs: u64,
    max_attempts: u32,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting background sync task with interval of {} seconds",
            interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            let completed = run_sync_round(&worker, &registry, max_attempts).await;
            if completed == 0 {
                debug!("Background sync: nothing completed this round");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use futures::future::FutureExt;

    use crate::config::Config;
    use crate::error::WorkerError;
    use crate::worker::test_support::MockFetcher;
    use crate::worker::SyncRoutine;

    fn worker() -> ServiceWorker {
        ServiceWorker::new(Config::default(), Arc::new(MockFetcher::new()))
    }

    /// Routine that fails every time and counts calls.
    fn failing_routine(calls: Arc<AtomicU32>) -> SyncRoutine {
        Arc::new(move |_tag: String| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(WorkerError::Network("still offline".into())) }.boxed()
        })
    }

    #[tokio::test]
    async fn test_round_completes_pending_tag() {
        let worker = worker();
        let registry = SyncRegistry::new();
        registry.register("background-sync").await;

        assert_eq!(run_sync_round(&worker, &registry, 3).await, 1);
        assert!(registry.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tag_completes_without_work() {
        let worker = worker();
        let registry = SyncRegistry::new();
        registry.register("upload-replays").await;

        assert_eq!(run_sync_round(&worker, &registry, 3).await, 1);
        assert!(registry.pending().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_tag_is_retried_then_dropped() {
        let calls = Arc::new(AtomicU32::new(0));
        let worker = worker().with_sync_routine(failing_routine(calls.clone()));
        let registry = SyncRegistry::new();
        registry.register("background-sync").await;

        assert_eq!(run_sync_round(&worker, &registry, 3).await, 0);
        assert_eq!(
            registry.pending().await,
            vec![("background-sync".to_string(), 1)]
        );

        run_sync_round(&worker, &registry, 3).await;
        run_sync_round(&worker, &registry, 3).await;

        assert!(registry.pending().await.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Nothing left to fire
        run_sync_round(&worker, &registry, 3).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_sync_task_fires_registrations() {
        let worker = worker();
        let registry = SyncRegistry::new();
        registry.register("background-sync").await;

        let handle = spawn_sync_task(worker, registry.clone(), 1, 3);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(registry.pending().await.is_empty());

        handle.abort();
    }

    #[tokio::test]
    async fn test_sync_task_can_be_aborted() {
        let handle = spawn_sync_task(worker(), SyncRegistry::new(), 1, 3);

        // Abort immediately
        handle.abort();

        // Wait a bit and verify task is finished
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
