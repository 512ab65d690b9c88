//! Client Registry
//!
//! Page sessions the worker may control. Sessions are keyed by page URL,
//! so a reload reuses the existing session.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;
use url::Url;

/// An open page session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Client {
    pub id: u64,
    pub url: String,
    /// Whether the active worker intercepts this page's requests
    pub controlled: bool,
}

#[derive(Debug, Default)]
struct Inner {
    clients: Vec<Client>,
    next_id: u64,
}

impl Inner {
    fn push(&mut self, url: &Url, controlled: bool) -> Client {
        let url = url.as_str();
        if let Some(existing) = self.clients.iter_mut().find(|c| c.url == url) {
            existing.controlled |= controlled;
            return existing.clone();
        }

        self.next_id += 1;
        let client = Client {
            id: self.next_id,
            url: url.to_string(),
            controlled,
        };
        self.clients.push(client.clone());
        client
    }
}

/// Shared registry of page sessions.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a page session loaded at `url`. Loading a page that already
    /// has a session reuses it; control is never taken away.
    pub async fn connect(&self, url: &Url, controlled: bool) -> Client {
        self.inner.write().await.push(url, controlled)
    }

    /// Puts every open session under the worker's control.
    ///
    /// Returns the number of sessions that were not controlled before.
    pub async fn claim(&self) -> usize {
        let mut inner = self.inner.write().await;
        let mut claimed = 0;
        for client in inner.clients.iter_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        info!("Claimed {} client(s)", claimed);
        claimed
    }

    /// Opens a new window at `url`; windows opened by the worker are controlled.
    pub async fn open_window(&self, url: &Url) -> Client {
        let client = self.inner.write().await.push(url, true);
        info!("Opened window {} at {}", client.id, client.url);
        client
    }

    pub async fn list(&self) -> Vec<Client> {
        self.inner.read().await.clients.clone()
    }

    pub async fn controlled_count(&self) -> usize {
        self.inner
            .read()
            .await
            .clients
            .iter()
            .filter(|c| c.controlled)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_connect_assigns_ids() {
        let clients = ClientRegistry::new();
        let a = clients.connect(&url("http://localhost:8080/"), false).await;
        let b = clients.connect(&url("http://localhost:8080/about"), true).await;

        assert_ne!(a.id, b.id);
        assert_eq!(clients.list().await.len(), 2);
        assert_eq!(clients.controlled_count().await, 1);
    }

    #[tokio::test]
    async fn test_reload_reuses_session() {
        let clients = ClientRegistry::new();
        let first = clients.connect(&url("http://localhost:8080/"), false).await;
        for _ in 0..100 {
            clients.connect(&url("http://localhost:8080/"), false).await;
        }
        let reloaded = clients.connect(&url("http://localhost:8080/"), true).await;

        assert_eq!(reloaded.id, first.id);
        assert!(reloaded.controlled);
        assert_eq!(clients.list().await.len(), 1);

        let again = clients.connect(&url("http://localhost:8080/"), false).await;
        assert!(again.controlled);
        assert_eq!(clients.controlled_count().await, 1);
    }

    #[tokio::test]
    async fn test_claim_controls_all() {
        let clients = ClientRegistry::new();
        clients.connect(&url("http://localhost:8080/"), false).await;
        clients.connect(&url("http://localhost:8080/index.html"), false).await;
        clients.connect(&url("http://localhost:8080/about"), true).await;

        assert_eq!(clients.claim().await, 2);
        assert_eq!(clients.controlled_count().await, 3);
        assert_eq!(clients.claim().await, 0);
    }

    #[tokio::test]
    async fn test_open_window() {
        let clients = ClientRegistry::new();
        let client = clients.open_window(&url("http://localhost:8080/?resume=1")).await;

        assert!(client.controlled);
        assert_eq!(client.url, "http://localhost:8080/?resume=1");
        assert_eq!(clients.list().await, vec![client]);
    }
}
