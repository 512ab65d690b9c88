//! Response Module
//!
//! Captured responses, as returned by the network or replayed from a cache store.

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use url::Url;

// == Response Type ==
/// Visibility class of a response, as seen by the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response with full access to status, headers and body
    Basic,
    /// Cross-origin response allowed by CORS
    Cors,
    /// Cross-origin response the page may not inspect
    Opaque,
}

// == Response ==
/// A complete response. Cloning duplicates the body, so one copy can be
/// stored while the other is returned.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub response_type: ResponseType,
    /// Final URL after redirects, if known
    pub url: Option<Url>,
    pub redirected: bool,
}

impl Response {
    /// Creates a basic response with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            url: None,
            redirected: false,
        }
    }

    /// Creates a basic 200 response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_header(mut self, name: header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// True for 2xx statuses.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Whether fetch interception may store this response.
    ///
    /// Only a 200 basic response that was not redirected qualifies.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK
            && self.response_type == ResponseType::Basic
            && !self.redirected
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
