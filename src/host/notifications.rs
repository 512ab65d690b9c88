//! Notification Center
//!
//! System notifications displayed on behalf of the worker.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

/// A button shown on a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Data attached to a notification for the click handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    #[serde(default)]
    pub url: Option<String>,
}

/// Display options for a notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationOptions {
    pub body: String,
    pub icon: String,
    pub badge: String,
    /// Vibration pattern in milliseconds, alternating vibrate/pause
    pub vibrate: Vec<u32>,
    pub data: NotificationData,
    pub actions: Vec<NotificationAction>,
}

/// A notification currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    #[serde(flatten)]
    pub options: NotificationOptions,
}

#[derive(Debug, Default)]
struct Inner {
    shown: Vec<Notification>,
    next_id: u64,
}

/// Shared list of displayed notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    inner: Arc<RwLock<Inner>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Displays a notification and returns it with its assigned id.
    pub async fn show(
        &self,
        title: impl Into<String>,
        options: NotificationOptions,
    ) -> Notification {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let notification = Notification {
            id: inner.next_id,
            title: title.into(),
            options,
        };
        inner.shown.push(notification.clone());

        info!(
            "Notification {} shown: {} - {}",
            notification.id, notification.title, notification.options.body
        );
        notification
    }

    /// Dismisses a notification. Returns false if it was not on screen.
    pub async fn close(&self, id: u64) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.shown.len();
        inner.shown.retain(|n| n.id != id);
        inner.shown.len() != before
    }

    pub async fn get(&self, id: u64) -> Option<Notification> {
        self.inner
            .read()
            .await
            .shown
            .iter()
            .find(|n| n.id == id)
            .cloned()
    }

    pub async fn list(&self) -> Vec<Notification> {
        self.inner.read().await.shown.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(body: &str) -> NotificationOptions {
        NotificationOptions {
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_show_and_list() {
        let center = NotificationCenter::new();
        let first = center.show("SYNAPSE", options("one")).await;
        let second = center.show("SYNAPSE", options("two")).await;

        assert_ne!(first.id, second.id);
        assert_eq!(center.list().await.len(), 2);
        assert_eq!(center.get(second.id).await.unwrap().options.body, "two");
    }

    #[tokio::test]
    async fn test_close() {
        let center = NotificationCenter::new();
        let shown = center.show("SYNAPSE", options("bye")).await;

        assert!(center.close(shown.id).await);
        assert!(!center.close(shown.id).await);
        assert!(center.get(shown.id).await.is_none());
        assert!(center.list().await.is_empty());
    }

    #[test]
    fn test_notification_serializes_flat() {
        let notification = Notification {
            id: 1,
            title: "SYNAPSE".to_string(),
            options: options("hello"),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["title"], "SYNAPSE");
        assert_eq!(json["body"], "hello");
    }
}
