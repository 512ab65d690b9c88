//! Install and activate handlers.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::{ExtendableEvent, ServiceWorker, WorkerState};
use crate::cache::CacheStorage;
use crate::error::Result;
use crate::fetch::{CacheMode, Request};

impl ServiceWorker {
    // == Install ==
    /// Pre-caches the manifest into the current store.
    ///
    /// A failed batch is logged and swallowed unless `swallow_install_errors`
    /// is off, in which case it fails the install.
    pub fn on_install(&self, event: &mut ExtendableEvent) {
        let caches = self.caches.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let config = Arc::clone(&self.config);
        let requests = self.manifest_requests();

        event.wait_until(async move {
            let outcome = match requests {
                Ok(requests) => {
                    let count = requests.len();
                    let cache = caches.open(&config.cache_name).await;
                    cache
                        .add_all(fetcher.as_ref(), requests)
                        .await
                        .map(|()| count)
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(count) => {
                    info!("Pre-cached {} manifest entries into {}", count, config.cache_name);
                    Ok(())
                }
                Err(e) if config.swallow_install_errors => {
                    warn!("Cache installation failed: {}", e);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        });

        if self.config.skip_waiting_on_install {
            self.request_skip_waiting();
        }
    }

    /// Manifest URLs as seed requests, bypassing HTTP caches when configured.
    fn manifest_requests(&self) -> Result<Vec<Request>> {
        let mode = if self.config.force_reload_on_install {
            CacheMode::Reload
        } else {
            CacheMode::Default
        };

        self.config
            .manifest
            .iter()
            .map(|url| -> Result<Request> {
                Ok(Request::get(self.resolve(url)?).with_cache_mode(mode))
            })
            .collect()
    }

    /// Runs the install event. On failure the worker becomes redundant.
    pub async fn install(&self) -> Result<()> {
        self.transition(WorkerState::Parsed, WorkerState::Installing)
            .await?;
        info!("Installing worker for {}", self.config.cache_name);

        let mut event = ExtendableEvent::new("install");
        self.on_install(&mut event);

        match event.settle().await {
            Ok(()) => {
                self.set_state(WorkerState::Installed).await;
                Ok(())
            }
            Err(e) => {
                warn!("Install failed, worker is redundant: {}", e);
                self.set_state(WorkerState::Redundant).await;
                Err(e)
            }
        }
    }

    // == Activate ==
    /// Deletes every store but the current one and claims open clients.
    ///
    /// Eviction and claiming are independent; a failed deletion does not
    /// prevent the claim.
    pub fn on_activate(&self, event: &mut ExtendableEvent) {
        let caches = self.caches.clone();
        let current = self.config.cache_name.clone();
        event.wait_until(async move {
            evict_stale_stores(&caches, &current).await?;
            Ok(())
        });

        let clients = self.clients.clone();
        event.wait_until(async move {
            clients.claim().await;
            Ok(())
        });
    }

    /// Runs the activate event. The worker is active afterwards even if
    /// eviction failed; the failure is still returned.
    pub async fn activate(&self) -> Result<()> {
        self.transition(WorkerState::Installed, WorkerState::Activating)
            .await?;

        let mut event = ExtendableEvent::new("activate");
        self.on_activate(&mut event);
        debug!("Waiting on {} activation task(s)", event.pending());
        let outcome = event.settle().await;

        self.set_state(WorkerState::Activated).await;
        info!("Worker for {} activated", self.config.cache_name);
        outcome
    }

    /// Installs, then activates unless old clients are still controlled and
    /// install did not request to skip waiting.
    pub async fn start(&self) -> Result<WorkerState> {
        self.install().await?;

        if self.skip_waiting_requested() || self.clients.controlled_count().await == 0 {
            self.activate().await?;
        } else {
            info!(
                "Worker for {} installed, waiting for controlled clients to close",
                self.config.cache_name
            );
        }

        Ok(self.state().await)
    }
}

/// Deletes every store whose name differs from `current`, concurrently.
///
/// All deletions are attempted; the first failure is returned. Returns the
/// number of stores deleted.
pub async fn evict_stale_stores(caches: &CacheStorage, current: &str) -> Result<usize> {
    let stale: Vec<String> = caches
        .keys()
        .await?
        .into_iter()
        .filter(|name| name != current)
        .collect();

    let results = join_all(stale.iter().map(|name| async move {
        info!("Deleting old cache: {}", name);
        caches.delete(name).await
    }))
    .await;

    let mut deleted = 0;
    for result in results {
        if result? {
            deleted += 1;
        }
    }
    Ok(deleted)
}
