//! Worker Module
//!
//! The offline cache worker: lifecycle handlers that populate and rotate
//! versioned cache stores, cache-first fetch interception, and the push,
//! notification-click and background-sync hooks.

mod events;
mod intercept;
mod lifecycle;
mod messaging;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use url::Url;

use crate::cache::CacheStorage;
use crate::config::Config;
use crate::error::{Result, WorkerError};
use crate::host::{ClientRegistry, Fetcher, NotificationCenter};

pub use events::{
    ExtendableEvent, FetchEvent, NotificationClickEvent, PushEvent, PushMessageData, SyncEvent,
};
pub use lifecycle::evict_stale_stores;
pub use messaging::{build_notification, sync_game_data, SyncRoutine};

// == Worker State ==
/// Lifecycle states of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, install not yet run
    Parsed,
    Installing,
    /// Installed and waiting to take over
    Installed,
    Activating,
    /// Active and intercepting fetches
    Activated,
    /// Install failed; this version will never activate
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

// == Service Worker ==
/// One version of the offline cache worker together with its host
/// capabilities.
///
/// Clone is cheap; clones share state, so handlers can move a clone into
/// work that outlives the handler call.
#[derive(Clone)]
pub struct ServiceWorker {
    config: Arc<Config>,
    caches: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    clients: ClientRegistry,
    notifications: NotificationCenter,
    sync_routine: SyncRoutine,
    state: Arc<RwLock<WorkerState>>,
    skip_waiting: Arc<AtomicBool>,
}

impl ServiceWorker {
    // == Constructors ==
    /// Creates a worker with fresh, empty host state.
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_host(
            config,
            CacheStorage::new(),
            fetcher,
            ClientRegistry::new(),
            NotificationCenter::new(),
        )
    }

    /// Creates a worker on top of existing host state.
    pub fn with_host(
        config: Config,
        caches: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
        clients: ClientRegistry,
        notifications: NotificationCenter,
    ) -> Self {
        Self {
            config: Arc::new(config),
            caches,
            fetcher,
            clients,
            notifications,
            sync_routine: messaging::default_sync_routine(),
            state: Arc::new(RwLock::new(WorkerState::Parsed)),
            skip_waiting: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Creates the next version of this worker, sharing its host state.
    pub fn successor(&self, config: Config) -> Self {
        Self::with_host(
            config,
            self.caches.clone(),
            Arc::clone(&self.fetcher),
            self.clients.clone(),
            self.notifications.clone(),
        )
    }

    /// Replaces the routine run when the sync tag fires.
    pub fn with_sync_routine(mut self, routine: SyncRoutine) -> Self {
        self.sync_routine = routine;
        self
    }

    // == Accessors ==
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// Whether install asked to take over without waiting for old clients.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub(crate) fn request_skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Resolves a URL relative to the worker scope; absolute URLs pass through.
    pub fn resolve(&self, url: &str) -> Result<Url> {
        self.config
            .scope
            .join(url)
            .map_err(|e| WorkerError::InvalidRequest(format!("Invalid URL '{}': {}", url, e)))
    }

    /// Moves from `from` to `to`, failing if the worker is in any other state.
    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<()> {
        let mut state = self.state.write().await;
        if *state != from {
            return Err(WorkerError::InvalidState(format!(
                "cannot move to {} from {} (expected {})",
                to, *state, from
            )));
        }
        *state = to;
        Ok(())
    }

    async fn set_state(&self, to: WorkerState) {
        *self.state.write().await = to;
    }
}

impl fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("cache_name", &self.config.cache_name)
            .field("scope", &self.config.scope.as_str())
            .finish_non_exhaustive()
    }
}
