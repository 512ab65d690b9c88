//! Cache Storage Module
//!
//! Registry of named cache stores shared by every event handler.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore};
use crate::error::{Result, WorkerError};
use crate::fetch::{Request, RequestKey, Response};
use crate::host::Fetcher;

type Stores = Arc<RwLock<HashMap<String, CacheStore>>>;

// == Cache Storage ==
/// All named cache stores.
///
/// Clone is cheap and every clone sees the same stores. Concurrent handlers
/// may read and write through it without further coordination.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    stores: Stores,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // == Open ==
    /// Returns a handle to the named store, creating it if absent.
    pub async fn open(&self, name: &str) -> Cache {
        let mut stores = self.stores.write().await;
        if !stores.contains_key(name) {
            debug!("Creating cache store {}", name);
            stores.insert(name.to_string(), CacheStore::new(name));
        }

        Cache {
            name: name.to_string(),
            stores: Arc::clone(&self.stores),
        }
    }

    pub async fn has(&self, name: &str) -> bool {
        self.stores.read().await.contains_key(name)
    }

    // == Delete ==
    /// Drops a store and all its entries. Returns false if it did not exist.
    pub async fn delete(&self, name: &str) -> Result<bool> {
        let removed = self.stores.write().await.remove(name).is_some();
        if removed {
            info!("Deleted cache store {}", name);
        }
        Ok(removed)
    }

    // == Keys ==
    /// Names of all stores, sorted.
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.stores.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Every store name with its entry count, sorted by name.
    pub async fn sizes(&self) -> Vec<(String, usize)> {
        let mut sizes: Vec<(String, usize)> = self
            .stores
            .read()
            .await
            .iter()
            .map(|(name, store)| (name.clone(), store.len()))
            .collect();
        sizes.sort();
        sizes
    }

    // == Stats ==
    /// Counters of the named store, if it exists.
    pub async fn stats(&self, name: &str) -> Option<CacheStats> {
        self.stores.read().await.get(name).map(CacheStore::stats)
    }
}

// == Cache ==
/// Handle to one named store.
///
/// Operations on a handle whose store has since been deleted fail with
/// `WorkerError::InvalidState`.
#[derive(Debug, Clone)]
pub struct Cache {
    name: String,
    stores: Stores,
}

impl Cache {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn detached(&self) -> WorkerError {
        WorkerError::InvalidState(format!("cache store '{}' was deleted", self.name))
    }

    // == Match ==
    /// Returns a copy of the stored response for the request, if any.
    pub async fn match_request(&self, request: &Request) -> Result<Option<Response>> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&self.name).ok_or_else(|| self.detached())?;
        Ok(store.match_request(request))
    }

    // == Put ==
    /// Stores `response` keyed by `request`.
    pub async fn put(&self, request: &Request, response: Response) -> Result<()> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&self.name).ok_or_else(|| self.detached())?;
        store.put(request, response)
    }

    // == Add All ==
    /// Fetches every request and stores all responses, or none of them.
    ///
    /// Fetches run concurrently. The batch fails if any fetch fails or returns
    /// a non-2xx status; the store is left untouched in that case.
    pub async fn add_all(&self, fetcher: &dyn Fetcher, requests: Vec<Request>) -> Result<()> {
        if let Some(bad) = requests.iter().find(|r| r.method != axum::http::Method::GET) {
            return Err(WorkerError::InvalidRequest(format!(
                "Only GET requests can be cached, got {}",
                bad.key()
            )));
        }

        let results = join_all(requests.iter().map(|request| fetcher.fetch(request))).await;

        let mut responses = Vec::with_capacity(requests.len());
        for (request, result) in requests.iter().zip(results) {
            let response = result.map_err(|e| WorkerError::ManifestFetch {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;
            if !response.is_ok() {
                return Err(WorkerError::ManifestFetch {
                    url: request.url.to_string(),
                    reason: format!("status {}", response.status),
                });
            }
            responses.push(response);
        }

        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&self.name).ok_or_else(|| self.detached())?;
        for (request, response) in requests.iter().zip(responses) {
            store.put(request, response)?;
        }

        debug!("Stored {} responses in {}", requests.len(), self.name);
        Ok(())
    }

    // == Delete ==
    /// Removes the entry for the request. Returns true if one existed.
    pub async fn delete(&self, request: &Request) -> Result<bool> {
        let mut stores = self.stores.write().await;
        let store = stores.get_mut(&self.name).ok_or_else(|| self.detached())?;
        Ok(store.delete(request))
    }

    // == Keys ==
    /// Request identities stored in this cache, in insertion order.
    pub async fn keys(&self) -> Result<Vec<RequestKey>> {
        let stores = self.stores.read().await;
        let store = stores.get(&self.name).ok_or_else(|| self.detached())?;
        Ok(store.keys())
    }

    pub async fn len(&self) -> Result<usize> {
        let stores = self.stores.read().await;
        let store = stores.get(&self.name).ok_or_else(|| self.detached())?;
        Ok(store.len())
    }
}
