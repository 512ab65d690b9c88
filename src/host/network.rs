//! Network Fetcher
//!
//! `Fetcher` backed by a reqwest client.

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::Fetcher;
use crate::error::{Result, WorkerError};
use crate::fetch::{same_origin, CacheMode, Request, Response, ResponseType};

/// Fetches resources over HTTP and classifies responses against the scope origin.
///
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    scope: Url,
}

impl HttpFetcher {
    /// Creates a fetcher for a worker controlling `scope`.
    pub fn new(scope: Url) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("offline_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WorkerError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, scope })
    }

    fn classify(&self, url: &Url, headers: &header::HeaderMap) -> ResponseType {
        if same_origin(url, &self.scope) {
            ResponseType::Basic
        } else if headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN) {
            ResponseType::Cors
        } else {
            ResponseType::Opaque
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"))
                .header(header::PRAGMA, HeaderValue::from_static("no-cache"));
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| WorkerError::Network(format!("{}: {}", request.url, e)))?;

        let final_url = resp.url().clone();
        let status = resp.status();
        let mut headers = resp.headers().clone();
        headers.remove(header::TRANSFER_ENCODING);
        headers.remove(header::CONNECTION);

        let response_type = self.classify(&final_url, &headers);
        let redirected = request.key().url() != final_url.as_str();

        let body = resp
            .bytes()
            .await
            .map_err(|e| WorkerError::Network(format!("{}: {}", request.url, e)))?;

        debug!(
            "Fetched {} {} -> {} ({:?}, {} bytes)",
            request.method,
            request.url,
            status,
            response_type,
            body.len()
        );

        let mut response = Response::new(status, body)
            .with_type(response_type)
            .with_url(final_url)
            .with_redirected(redirected);
        response.headers = headers;
        Ok(response)
    }
}
