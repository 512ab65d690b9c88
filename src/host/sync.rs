//! Sync Registry
//!
//! Background sync tags waiting to be fired, with their failed attempt counts.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Shared set of pending sync registrations.
#[derive(Debug, Clone, Default)]
pub struct SyncRegistry {
    pending: Arc<RwLock<BTreeMap<String, u32>>>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag. Re-registering a pending tag keeps its attempt count.
    pub async fn register(&self, tag: impl Into<String>) {
        self.pending.write().await.entry(tag.into()).or_insert(0);
    }

    /// Pending tags with the number of failed attempts so far, ordered by tag.
    pub async fn pending(&self) -> Vec<(String, u32)> {
        self.pending
            .read()
            .await
            .iter()
            .map(|(tag, attempts)| (tag.clone(), *attempts))
            .collect()
    }

    /// Removes a tag after it fired successfully or was given up on.
    pub async fn complete(&self, tag: &str) -> bool {
        self.pending.write().await.remove(tag).is_some()
    }

    /// Counts a failed attempt and returns the new total.
    pub async fn record_failure(&self, tag: &str) -> u32 {
        let mut pending = self.pending.write().await;
        let attempts = pending.entry(tag.to_string()).or_insert(0);
        *attempts += 1;
        *attempts
    }
}
