//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::host::{Client, Notification};
use crate::worker::WorkerState;

/// Response body for lifecycle endpoints (POST /__sw/install, /__sw/activate)
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleResponse {
    pub cache_name: String,
    pub state: WorkerState,
    pub skip_waiting: bool,
}

/// One cache store in the cache listing
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub name: String,
    pub entries: usize,
    pub current: bool,
}

/// Response body for the cache listing (GET /__sw/caches)
#[derive(Debug, Clone, Serialize)]
pub struct CacheListResponse {
    pub caches: Vec<CacheSummary>,
}

impl CacheListResponse {
    /// Builds the listing, flagging the store named `current`.
    pub fn new(sizes: Vec<(String, usize)>, current: &str) -> Self {
        Self {
            caches: sizes
                .into_iter()
                .map(|(name, entries)| CacheSummary {
                    current: name == current,
                    name,
                    entries,
                })
                .collect(),
        }
    }
}

/// Response body for the stats endpoint (GET /__sw/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Name of the current cache store
    pub cache_name: String,
    /// Lookups answered from the store
    pub hits: u64,
    /// Lookups with no stored entry
    pub misses: u64,
    /// Responses written into the store
    pub puts: u64,
    /// Current number of entries in the store
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from store statistics
    pub fn new(cache_name: impl Into<String>, stats: &CacheStats) -> Self {
        Self {
            cache_name: cache_name.into(),
            hits: stats.hits,
            misses: stats.misses,
            puts: stats.puts,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// A sync registration waiting to fire
#[derive(Debug, Clone, Serialize)]
pub struct PendingSync {
    pub tag: String,
    pub failed_attempts: u32,
}

/// Response body for sync endpoints (POST /__sw/sync/:tag, GET /__sw/sync)
#[derive(Debug, Clone, Serialize)]
pub struct SyncResponse {
    pub pending: Vec<PendingSync>,
}

impl SyncResponse {
    pub fn new(pending: Vec<(String, u32)>) -> Self {
        Self {
            pending: pending
                .into_iter()
                .map(|(tag, failed_attempts)| PendingSync {
                    tag,
                    failed_attempts,
                })
                .collect(),
        }
    }
}

/// Response body listing displayed notifications (GET /__sw/notifications, POST /__sw/push)
#[derive(Debug, Clone, Serialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
}

/// Response body for a notification click
#[derive(Debug, Clone, Serialize)]
pub struct NotificationClickResponse {
    /// URL of the window opened by the click, if any
    pub opened: Option<String>,
}

/// Response body listing page sessions (GET /__sw/clients)
#[derive(Debug, Clone, Serialize)]
pub struct ClientListResponse {
    pub clients: Vec<Client>,
}

/// Response body for the health endpoint (GET /__sw/health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Worker lifecycle state
    pub worker: WorkerState,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(worker: WorkerState) -> Self {
        Self {
            status: "healthy".to_string(),
            worker,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
