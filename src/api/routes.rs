//! API Routes
//!
//! Configures the Axum router: admin endpoints under `/__sw`, everything
//! else intercepted by the worker.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    activate_handler, caches_handler, clients_handler, health_handler, install_handler,
    notification_click_handler, notifications_handler, pending_sync_handler, proxy_handler,
    push_handler, register_sync_handler, stats_handler, AppState,
};

/// Prefix of the admin endpoints.
pub const ADMIN_PREFIX: &str = "/__sw";

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /__sw/health` - Health check and worker state
/// - `GET /__sw/stats` - Counters of the current cache store
/// - `GET /__sw/caches` - All cache stores and their sizes
/// - `POST /__sw/install` - Run the install phase
/// - `POST /__sw/activate` - Run the activate phase
/// - `POST /__sw/sync/:tag` - Register a background sync tag
/// - `GET /__sw/sync` - Pending sync tags
/// - `POST /__sw/push` - Deliver a push message (raw body)
/// - `GET /__sw/notifications` - Displayed notifications
/// - `POST /__sw/notifications/:id/click` - Click a notification
/// - `GET /__sw/clients` - Page sessions
/// - anything else - Fetch interception against the worker scope
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let admin = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/caches", get(caches_handler))
        .route("/install", post(install_handler))
        .route("/activate", post(activate_handler))
        .route("/sync", get(pending_sync_handler))
        .route("/sync/:tag", post(register_sync_handler))
        .route("/push", post(push_handler))
        .route("/notifications", get(notifications_handler))
        .route("/notifications/:id/click", post(notification_click_handler))
        .route("/clients", get(clients_handler));

    Router::new()
        .nest(ADMIN_PREFIX, admin)
        .fallback(proxy_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::Config;
    use crate::fetch::Response;
    use crate::worker::test_support::MockFetcher;
    use crate::worker::ServiceWorker;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> (Router, Arc<MockFetcher>) {
        let config = Config {
            manifest: vec!["./".to_string(), "./index.html".to_string()],
            ..Config::default()
        };
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.serve("http://localhost:8080/", Response::ok("home"));
        fetcher.serve("http://localhost:8080/index.html", Response::ok("<h1>SYNAPSE</h1>"));

        let worker = ServiceWorker::new(config, fetcher.clone());
        (create_router(AppState::new(worker)), fetcher)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["worker"], "parsed");
    }

    #[tokio::test]
    async fn test_install_endpoint_precaches_manifest() {
        let (app, _) = create_test_app();

        let response = app.clone().oneshot(post("/__sw/install", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["state"], "installed");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/caches")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["caches"][0]["name"], "synapse-game-v1.0.0");
        assert_eq!(json["caches"][0]["entries"], 2);
        assert_eq!(json["caches"][0]["current"], true);
    }

    #[tokio::test]
    async fn test_activate_before_install_conflicts() {
        let (app, _) = create_test_app();

        let response = app.oneshot(post("/__sw/activate", "")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_fallback_serves_from_cache_once_active() {
        let (app, fetcher) = create_test_app();

        app.clone().oneshot(post("/__sw/install", "")).await.unwrap();
        app.clone().oneshot(post("/__sw/activate", "")).await.unwrap();
        fetcher.go_offline();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/index.html")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<h1>SYNAPSE</h1>");
    }

    #[tokio::test]
    async fn test_reloading_a_page_keeps_one_session() {
        let (app, _) = create_test_app();

        app.clone().oneshot(post("/__sw/install", "")).await.unwrap();
        app.clone().oneshot(post("/__sw/activate", "")).await.unwrap();

        for _ in 0..50 {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .uri("/")
                        .header("accept", "text/html")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/clients")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        let clients = json["clients"].as_array().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0]["url"], "http://localhost:8080/");
        assert_eq!(clients[0]["controlled"], true);
    }

    #[tokio::test]
    async fn test_fallback_network_error_is_bad_gateway() {
        let (app, fetcher) = create_test_app();
        fetcher.go_offline();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/missing.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_sync_endpoints() {
        let (app, _) = create_test_app();

        let response = app
            .clone()
            .oneshot(post("/__sw/sync/background-sync", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/__sw/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["pending"][0]["tag"], "background-sync");
        assert_eq!(json["pending"][0]["failed_attempts"], 0);
    }

    #[tokio::test]
    async fn test_push_endpoint_rejects_malformed_json() {
        let (app, _) = create_test_app();

        let response = app.oneshot(post("/__sw/push", "{broken")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_click_unknown_notification_not_found() {
        let (app, _) = create_test_app();

        let response = app
            .oneshot(post("/__sw/notifications/42/click", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
