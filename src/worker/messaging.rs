//! Background sync, push and notification-click hooks.

use std::sync::Arc;

use axum::body::Bytes;
use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use super::{NotificationClickEvent, PushEvent, PushMessageData, ServiceWorker, SyncEvent};
use crate::config::PushPayloadFormat;
use crate::error::{Result, WorkerError};
use crate::host::{NotificationAction, NotificationData, NotificationOptions};

const DEFAULT_TITLE: &str = "SYNAPSE";
const DEFAULT_BODY: &str = "SYNAPSE - Something lurks in the shadows...";
const ICON: &str = "./Icon.png";
const VIBRATE_PATTERN: [u32; 3] = [200, 100, 200];
const SITE_ROOT: &str = "./";

/// Action button that resumes the game.
pub const PRIMARY_ACTION: &str = "play";
/// Action button that only dismisses.
pub const DISMISS_ACTION: &str = "close";

/// Routine run when the configured sync tag fires; receives the tag.
pub type SyncRoutine = Arc<dyn Fn(String) -> BoxFuture<'static, Result<()>> + Send + Sync>;

pub(super) fn default_sync_routine() -> SyncRoutine {
    Arc::new(|_tag: String| sync_game_data().boxed())
}

/// Synchronizes game data once connectivity returns.
///
/// Nothing is queued for upload yet, so this only records that the sync ran.
pub async fn sync_game_data() -> Result<()> {
    info!("Background sync: game data synchronized");
    Ok(())
}

/// Builds the notification for a push payload.
///
/// JSON payloads may carry `title`, `body` and `url`; empty or non-string
/// fields fall back to defaults. Text payloads become the body.
pub fn build_notification(
    format: PushPayloadFormat,
    data: &PushMessageData,
) -> Result<(String, NotificationOptions)> {
    let (title, body, url) = match format {
        PushPayloadFormat::Json => {
            let payload: Value = data.json()?;
            let field = |name: &str| {
                payload
                    .get(name)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
            };
            (field("title"), field("body"), field("url"))
        }
        PushPayloadFormat::Text => {
            let text = data.text();
            (None, Some(text).filter(|s| !s.is_empty()), None)
        }
    };

    let options = NotificationOptions {
        body: body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
        icon: ICON.to_string(),
        badge: ICON.to_string(),
        vibrate: VIBRATE_PATTERN.to_vec(),
        data: NotificationData {
            url: Some(url.unwrap_or_else(|| SITE_ROOT.to_string())),
        },
        actions: vec![
            NotificationAction {
                action: PRIMARY_ACTION.to_string(),
                title: "Continue Game".to_string(),
                icon: Some(ICON.to_string()),
            },
            NotificationAction {
                action: DISMISS_ACTION.to_string(),
                title: "Dismiss".to_string(),
                icon: None,
            },
        ],
    };

    Ok((title.unwrap_or_else(|| DEFAULT_TITLE.to_string()), options))
}

/// Where a notification click should navigate, if anywhere.
///
/// The primary action opens the notification's URL and any other click
/// opens the site root. The dismiss action is the one exception to the
/// root default: it only closes the notification and opens no window.
fn click_target(action: Option<&str>, data: &NotificationData) -> Option<String> {
    match action {
        Some(PRIMARY_ACTION) => Some(data.url.clone().unwrap_or_else(|| SITE_ROOT.to_string())),
        Some(DISMISS_ACTION) => None,
        _ => Some(SITE_ROOT.to_string()),
    }
}

impl ServiceWorker {
    // == Sync ==
    /// Runs the sync routine when the configured tag fires; other tags are
    /// ignored.
    pub fn on_sync(&self, event: &mut SyncEvent) {
        if event.tag != self.config.sync_tag {
            debug!("Ignoring sync tag {}", event.tag);
            return;
        }

        let routine = Arc::clone(&self.sync_routine);
        let tag = event.tag.clone();
        event.lifetime.wait_until(async move { routine(tag).await });
    }

    /// Fires a sync event. A rejection tells the host to retry later.
    pub async fn dispatch_sync(&self, tag: &str, last_chance: bool) -> Result<()> {
        let mut event = SyncEvent::new(tag, last_chance);
        self.on_sync(&mut event);

        event.lifetime.settle().await.map_err(|e| match e {
            WorkerError::Sync(_) => e,
            other => WorkerError::Sync(other.to_string()),
        })
    }

    // == Push ==
    /// Shows a notification for a push message with a payload.
    pub fn on_push(&self, event: &mut PushEvent) {
        let Some(data) = event.data.clone() else {
            debug!("Push message without payload ignored");
            return;
        };

        let format = self.config.push_payload_format;
        let notifications = self.notifications.clone();
        event.lifetime.wait_until(async move {
            let (title, options) = build_notification(format, &data)?;
            notifications.show(title, options).await;
            Ok(())
        });
    }

    /// Delivers a push message; `None` means a message without payload.
    pub async fn dispatch_push(&self, payload: Option<Bytes>) -> Result<()> {
        let mut event = PushEvent::new(payload.map(PushMessageData::new));
        self.on_push(&mut event);
        event.lifetime.settle().await
    }

    // == Notification Click ==
    /// Dismisses the notification and opens the window the click asks for.
    pub fn on_notification_click(&self, event: &mut NotificationClickEvent) {
        let id = event.notification.id;
        let target = click_target(event.action.as_deref(), &event.notification.options.data)
            .map(|url| self.resolve(&url));
        let notifications = self.notifications.clone();
        let clients = self.clients.clone();

        event.lifetime.wait_until(async move {
            notifications.close(id).await;
            if let Some(url) = target {
                clients.open_window(&url?).await;
            }
            Ok(())
        });
    }

    /// Clicks a displayed notification. Returns the URL of the window
    /// opened, if any.
    pub async fn dispatch_notification_click(
        &self,
        id: u64,
        action: Option<String>,
    ) -> Result<Option<Url>> {
        let notification = self
            .notifications
            .get(id)
            .await
            .ok_or_else(|| WorkerError::NotFound(format!("notification {}", id)))?;

        let target = click_target(action.as_deref(), &notification.options.data)
            .map(|url| self.resolve(&url))
            .transpose()?;

        let mut event = NotificationClickEvent::new(notification, action);
        self.on_notification_click(&mut event);
        event.lifetime.settle().await?;

        Ok(target)
    }
}
