//! Host Module
//!
//! Capabilities the worker consumes from its host: network fetch, page
//! clients, system notifications and background sync registrations.
//!
//! # Capabilities
//! - `Fetcher`: fetch a resource (`HttpFetcher` goes over the network)
//! - `ClientRegistry`: page sessions, claim and open-window
//! - `NotificationCenter`: show and close notifications
//! - `SyncRegistry`: pending background sync tags

mod clients;
mod network;
mod notifications;
mod sync;

use async_trait::async_trait;

use crate::error::Result;
use crate::fetch::{Request, Response};

pub use clients::{Client, ClientRegistry};
pub use network::HttpFetcher;
pub use notifications::{
    Notification, NotificationAction, NotificationCenter, NotificationData, NotificationOptions,
};
pub use sync::SyncRegistry;

// == Fetcher ==
/// Fetches a resource on behalf of the worker.
///
/// Implementations report transport failures as `WorkerError::Network`;
/// any HTTP status, including errors, is a successful fetch.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}
