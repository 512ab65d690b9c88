//! API Handlers
//!
//! HTTP handlers for the admin endpoints and the intercepting proxy.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, WorkerError};
use crate::fetch::{self, Destination};
use crate::host::{HttpFetcher, SyncRegistry};
use crate::models::{
    CacheListResponse, ClientListResponse, HealthResponse, LifecycleResponse,
    NotificationClickRequest, NotificationClickResponse, NotificationListResponse,
    StatsResponse, SyncResponse,
};
use crate::worker::{ServiceWorker, WorkerState};

/// Largest request body forwarded to the origin.
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The running worker version
    pub worker: ServiceWorker,
    /// Pending background sync registrations
    pub sync: SyncRegistry,
}

impl AppState {
    /// Creates a new AppState around the given worker.
    pub fn new(worker: ServiceWorker) -> Self {
        Self {
            worker,
            sync: SyncRegistry::new(),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The worker fetches from the network with an `HttpFetcher` scoped to
    /// the configured origin.
    pub fn from_config(config: &Config) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.scope.clone())?;
        Ok(Self::new(ServiceWorker::new(config.clone(), Arc::new(fetcher))))
    }

    async fn lifecycle(&self) -> LifecycleResponse {
        LifecycleResponse {
            cache_name: self.worker.config().cache_name.clone(),
            state: self.worker.state().await,
            skip_waiting: self.worker.skip_waiting_requested(),
        }
    }
}

/// Handler for GET /__sw/health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.worker.state().await))
}

/// Handler for GET /__sw/stats
///
/// Returns counters of the current cache store.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let name = &state.worker.config().cache_name;
    let stats = state.worker.caches().stats(name).await.unwrap_or_default();
    Json(StatsResponse::new(name.clone(), &stats))
}

/// Handler for GET /__sw/caches
pub async fn caches_handler(State(state): State<AppState>) -> Json<CacheListResponse> {
    let sizes = state.worker.caches().sizes().await;
    Json(CacheListResponse::new(
        sizes,
        &state.worker.config().cache_name,
    ))
}

/// Handler for POST /__sw/install
pub async fn install_handler(State(state): State<AppState>) -> Result<Json<LifecycleResponse>> {
    state.worker.install().await?;
    Ok(Json(state.lifecycle().await))
}

/// Handler for POST /__sw/activate
pub async fn activate_handler(State(state): State<AppState>) -> Result<Json<LifecycleResponse>> {
    state.worker.activate().await?;
    Ok(Json(state.lifecycle().await))
}

/// Handler for POST /__sw/sync/:tag
///
/// Registers a sync tag; the background sync task fires it.
pub async fn register_sync_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<(StatusCode, Json<SyncResponse>)> {
    if tag.trim().is_empty() {
        return Err(WorkerError::InvalidRequest("Sync tag cannot be empty".to_string()));
    }

    state.sync.register(tag).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(SyncResponse::new(state.sync.pending().await)),
    ))
}

/// Handler for GET /__sw/sync
pub async fn pending_sync_handler(State(state): State<AppState>) -> Json<SyncResponse> {
    Json(SyncResponse::new(state.sync.pending().await))
}

/// Handler for POST /__sw/push
///
/// The raw request body is the push payload; an empty body is a push
/// without payload.
pub async fn push_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NotificationListResponse>> {
    let payload = if body.is_empty() { None } else { Some(body) };
    state.worker.dispatch_push(payload).await?;

    Ok(Json(NotificationListResponse {
        notifications: state.worker.notifications().list().await,
    }))
}

/// Handler for GET /__sw/notifications
pub async fn notifications_handler(
    State(state): State<AppState>,
) -> Json<NotificationListResponse> {
    Json(NotificationListResponse {
        notifications: state.worker.notifications().list().await,
    })
}

/// Handler for POST /__sw/notifications/:id/click
///
/// The body is optional; `{"action": "play"}` clicks an action button.
pub async fn notification_click_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    body: Bytes,
) -> Result<Json<NotificationClickResponse>> {
    let req: NotificationClickRequest = if body.is_empty() {
        NotificationClickRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| WorkerError::InvalidRequest(format!("Invalid click body: {}", e)))?
    };
    if let Some(error_msg) = req.validate() {
        return Err(WorkerError::InvalidRequest(error_msg));
    }

    let opened = state
        .worker
        .dispatch_notification_click(id, req.action)
        .await?;

    Ok(Json(NotificationClickResponse {
        opened: opened.map(String::from),
    }))
}

/// Handler for GET /__sw/clients
pub async fn clients_handler(State(state): State<AppState>) -> Json<ClientListResponse> {
    Json(ClientListResponse {
        clients: state.worker.clients().list().await,
    })
}

/// Fallback handler: every other request goes through fetch interception.
///
/// The request path is resolved against the worker scope. Document
/// navigations also register a page session.
pub async fn proxy_handler(State(state): State<AppState>, request: Request) -> Result<Response> {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, MAX_BODY_SIZE)
        .await
        .map_err(|e| WorkerError::InvalidRequest(format!("Failed to read body: {}", e)))?;

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let url = state
        .worker
        .resolve(&format!("./{}", path.trim_start_matches('/')))?;

    let destination = destination_of(&parts.method, &parts.headers);
    let request = fetch::Request::new(parts.method, url.clone())
        .with_headers(forwarded_headers(parts.headers))
        .with_body(body)
        .with_destination(destination);

    if request.is_navigation() {
        let controlled = state.worker.state().await == WorkerState::Activated;
        state.worker.clients().connect(&url, controlled).await;
    }

    debug!("Intercepting {}", request.key());
    let response = state.worker.handle_fetch(request).await?;
    Ok(response.into_response())
}

/// Request destination from `Sec-Fetch-Dest`, or a guess from `Accept` for
/// clients that do not send it.
fn destination_of(method: &Method, headers: &HeaderMap) -> Destination {
    if let Some(dest) = headers.get("sec-fetch-dest").and_then(|v| v.to_str().ok()) {
        return Destination::from_header(dest);
    }

    let accepts_html = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("text/html"));

    if *method == Method::GET && accepts_html {
        Destination::Document
    } else {
        Destination::Empty
    }
}

/// Drops headers that describe the incoming connection rather than the request.
fn forwarded_headers(mut headers: HeaderMap) -> HeaderMap {
    for name in [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
        header::UPGRADE,
    ] {
        headers.remove(name);
    }
    headers
}
