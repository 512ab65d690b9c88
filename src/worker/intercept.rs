//! Fetch interception: cache first, then network, then the offline page.

use std::sync::Arc;

use axum::http::Method;
use tracing::{debug, warn};
use url::Url;

use super::{FetchEvent, ServiceWorker, WorkerState};
use crate::cache::CacheStorage;
use crate::error::Result;
use crate::fetch::{Request, Response};
use crate::host::Fetcher;

impl ServiceWorker {
    /// Answers the request from the current store, falling back to the network.
    pub fn on_fetch(&self, event: &mut FetchEvent) {
        let lookup = CacheFirst {
            caches: self.caches.clone(),
            fetcher: Arc::clone(&self.fetcher),
            cache_name: self.config.cache_name.clone(),
            offline_page: self.resolve(&self.config.offline_fallback).ok(),
        };
        let request = event.request().clone();

        if let Err(e) = event.respond_with(lookup.respond(request)) {
            warn!("Fetch event already handled: {}", e);
        }
    }

    /// Dispatches a fetch event. Until the worker is active, requests go
    /// straight to the network.
    pub async fn handle_fetch(&self, request: Request) -> Result<Response> {
        let mut event = FetchEvent::new(request);
        if self.state().await == WorkerState::Activated {
            self.on_fetch(&mut event);
        }
        if !event.is_handled() {
            debug!("Not controlling {}, passing to network", event.request().key());
        }
        event.into_response(self.fetcher.as_ref()).await
    }
}

struct CacheFirst {
    caches: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    cache_name: String,
    offline_page: Option<Url>,
}

impl CacheFirst {
    async fn respond(self, request: Request) -> Result<Response> {
        let cache = self.caches.open(&self.cache_name).await;

        if let Some(cached) = cache.match_request(&request).await? {
            debug!("Cache hit: {}", request.key());
            return Ok(cached);
        }

        match self.fetcher.fetch(&request).await {
            Ok(response) => {
                if request.method == Method::GET && response.is_cacheable() {
                    if let Err(e) = cache.put(&request, response.clone()).await {
                        warn!("Failed to cache {}: {}", request.key(), e);
                    }
                }
                Ok(response)
            }
            Err(e) if request.is_navigation() => {
                let fallback = match self.offline_page {
                    Some(url) => cache.match_request(&Request::get(url)).await?,
                    None => None,
                };
                match fallback {
                    Some(page) => {
                        warn!("Network unavailable for {}, serving offline page", request.url);
                        Ok(page)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
