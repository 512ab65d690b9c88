//! Worker Events
//!
//! Event values handed to the worker's handlers. Handlers extend an event's
//! lifetime with `wait_until`; the dispatcher then settles the event by
//! awaiting every piece of extended work.

use std::future::Future;

use axum::body::Bytes;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::{Result, WorkerError};
use crate::fetch::{Request, Response};
use crate::host::{Fetcher, Notification};

// == Extendable Event ==
/// Lifetime of an event whose handler may keep working after it returns.
#[derive(Debug)]
pub struct ExtendableEvent {
    kind: &'static str,
    pending: Vec<JoinHandle<Result<()>>>,
}

impl ExtendableEvent {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            pending: Vec::new(),
        }
    }

    /// Keeps the event alive until `work` completes.
    ///
    /// The work starts running immediately on the runtime.
    pub fn wait_until<F>(&mut self, work: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.pending.push(tokio::spawn(work));
    }

    /// Number of lifetime extensions registered so far.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Waits for all extended work. Every extension runs to completion; the
    /// first failure, if any, is returned.
    pub async fn settle(self) -> Result<()> {
        let mut first_error = None;

        for handle in self.pending {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(WorkerError::Internal(format!(
                    "{} handler task failed: {}",
                    self.kind, e
                ))),
            };

            if let Err(e) = outcome {
                warn!("{} event work rejected: {}", self.kind, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

// == Fetch Event ==
/// A request from a controlled page, awaiting a response.
#[derive(Debug)]
pub struct FetchEvent {
    request: Request,
    response: Option<JoinHandle<Result<Response>>>,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: None,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Substitutes the response the page receives.
    ///
    /// May be called once per event.
    pub fn respond_with<F>(&mut self, response: F) -> Result<()>
    where
        F: Future<Output = Result<Response>> + Send + 'static,
    {
        if self.response.is_some() {
            return Err(WorkerError::InvalidState(format!(
                "respond_with already called for {}",
                self.request.key()
            )));
        }
        self.response = Some(tokio::spawn(response));
        Ok(())
    }

    pub fn is_handled(&self) -> bool {
        self.response.is_some()
    }

    /// Resolves the event: the substituted response if there is one,
    /// otherwise a plain network fetch.
    pub async fn into_response(self, network: &dyn Fetcher) -> Result<Response> {
        match self.response {
            Some(handle) => handle.await.map_err(|e| {
                WorkerError::Internal(format!("fetch handler task failed: {}", e))
            })?,
            None => network.fetch(&self.request).await,
        }
    }
}

// == Sync Event ==
/// A background sync registration firing.
#[derive(Debug)]
pub struct SyncEvent {
    pub tag: String,
    /// Set on the final attempt before the host gives up on the tag
    pub last_chance: bool,
    pub lifetime: ExtendableEvent,
}

impl SyncEvent {
    pub fn new(tag: impl Into<String>, last_chance: bool) -> Self {
        Self {
            tag: tag.into(),
            last_chance,
            lifetime: ExtendableEvent::new("sync"),
        }
    }
}

// == Push Event ==
/// Payload of a push message.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessageData(Bytes);

impl PushMessageData {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.0)?)
    }
}

/// A push message delivered to the worker.
#[derive(Debug)]
pub struct PushEvent {
    pub data: Option<PushMessageData>,
    pub lifetime: ExtendableEvent,
}

impl PushEvent {
    pub fn new(data: Option<PushMessageData>) -> Self {
        Self {
            data,
            lifetime: ExtendableEvent::new("push"),
        }
    }
}

// == Notification Click Event ==
/// A click on a notification or one of its action buttons.
#[derive(Debug)]
pub struct NotificationClickEvent {
    pub notification: Notification,
    /// Action button identifier; `None` for a click on the notification body
    pub action: Option<String>,
    pub lifetime: ExtendableEvent,
}

impl NotificationClickEvent {
    pub fn new(notification: Notification, action: Option<String>) -> Self {
        Self {
            notification,
            action,
            lifetime: ExtendableEvent::new("notificationclick"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    struct EchoFetcher;

    #[async_trait]
    impl Fetcher for EchoFetcher {
        async fn fetch(&self, request: &Request) -> Result<Response> {
            Ok(Response::ok(format!("network:{}", request.url.path())))
        }
    }

    fn request() -> Request {
        Request::get(Url::parse("http://localhost:8080/index.html").unwrap())
    }

    #[tokio::test]
    async fn test_settle_waits_for_extended_work() {
        let done = Arc::new(AtomicBool::new(false));
        let mut event = ExtendableEvent::new("install");

        let flag = Arc::clone(&done);
        event.wait_until(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(event.pending(), 1);
        event.settle().await.unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settle_runs_all_and_reports_first_error() {
        let done = Arc::new(AtomicBool::new(false));
        let mut event = ExtendableEvent::new("activate");

        event.wait_until(async { Err(WorkerError::Internal("first".into())) });
        let flag = Arc::clone(&done);
        event.wait_until(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });
        event.wait_until(async { Err(WorkerError::Internal("second".into())) });

        let err = event.settle().await.unwrap_err();
        assert_eq!(err.to_string(), "Internal error: first");
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_settle_with_nothing_pending() {
        assert!(ExtendableEvent::new("sync").settle().await.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_event_defaults_to_network() {
        let event = FetchEvent::new(request());
        assert!(!event.is_handled());

        let resp = event.into_response(&EchoFetcher).await.unwrap();
        assert_eq!(resp.text(), "network:/index.html");
    }

    #[tokio::test]
    async fn test_fetch_event_respond_with() {
        let mut event = FetchEvent::new(request());
        event.respond_with(async { Ok(Response::ok("cached")) }).unwrap();

        let second = event.respond_with(async { Ok(Response::ok("again")) });
        assert!(matches!(second, Err(WorkerError::InvalidState(_))));

        let resp = event.into_response(&EchoFetcher).await.unwrap();
        assert_eq!(resp.text(), "cached");
    }

    #[test]
    fn test_push_data_accessors() {
        let data = PushMessageData::new(r#"{"title":"Wake up"}"#);
        assert_eq!(data.text(), r#"{"title":"Wake up"}"#);

        let value: serde_json::Value = data.json().unwrap();
        assert_eq!(value["title"], "Wake up");

        let bad = PushMessageData::new("not json");
        assert!(matches!(
            bad.json::<serde_json::Value>(),
            Err(WorkerError::PushPayload(_))
        ));
    }
}
