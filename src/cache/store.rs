//! Cache Store Module
//!
//! A single named store mapping request identity to captured responses.

use std::collections::HashMap;

use axum::http::Method;

use crate::cache::CacheStats;
use crate::error::{Result, WorkerError};
use crate::fetch::{Request, RequestKey, Response};

// == Cache Store ==
/// Named store of request/response pairs.
///
/// Only GET requests are stored or matched. Keys are reported in insertion
/// order; overwriting an entry keeps its original position.
#[derive(Debug)]
pub struct CacheStore {
    /// Store name, e.g. `synapse-game-v1.0.0`
    name: String,
    /// Request identity to stored response
    entries: HashMap<RequestKey, Response>,
    /// Keys in first-insertion order
    order: Vec<RequestKey>,
    /// Activity counters
    stats: CacheStats,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: HashMap::new(),
            order: Vec::new(),
            stats: CacheStats::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Match ==
    /// Looks up the stored response for a request.
    ///
    /// Returns an independent copy of the stored response. Non-GET requests
    /// never match.
    pub fn match_request(&mut self, request: &Request) -> Option<Response> {
        if request.method != Method::GET {
            self.stats.record_miss();
            return None;
        }

        match self.entries.get(&request.key()) {
            Some(response) => {
                self.stats.record_hit();
                Some(response.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores a response keyed by the request, replacing any previous entry.
    pub fn put(&mut self, request: &Request, response: Response) -> Result<()> {
        if request.method != Method::GET {
            return Err(WorkerError::InvalidRequest(format!(
                "Only GET requests can be cached, got {}",
                request.method
            )));
        }

        let key = request.key();
        if !self.entries.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.entries.insert(key, response);

        self.stats.record_put();
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Delete ==
    /// Removes the entry for a request. Returns true if one existed.
    pub fn delete(&mut self, request: &Request) -> bool {
        let key = request.key();
        if self.entries.remove(&key).is_some() {
            self.order.retain(|k| k != &key);
            self.stats.set_total_entries(self.entries.len());
            true
        } else {
            false
        }
    }

    // == Keys ==
    /// Returns every stored request identity in insertion order.
    pub fn keys(&self) -> Vec<RequestKey> {
        self.order.clone()
    }

    // == Stats ==
    /// Returns current store statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
