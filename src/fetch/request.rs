//! Request Module
//!
//! Intercepted request values and the identity used to key cache entries.

use std::fmt;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use serde::Serialize;
use url::Url;

// == Destination ==
/// What the requesting page intends to do with the response.
///
/// Mirrors the `Sec-Fetch-Dest` request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    /// `fetch()` / XHR with no particular destination
    #[default]
    Empty,
    /// Full page navigation
    Document,
    Script,
    Style,
    Image,
    Font,
    Manifest,
    Other,
}

impl Destination {
    /// Parses a `Sec-Fetch-Dest` header value.
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "empty" => Destination::Empty,
            "document" | "iframe" | "frame" => Destination::Document,
            "script" | "worker" | "sharedworker" => Destination::Script,
            "style" => Destination::Style,
            "image" => Destination::Image,
            "font" => Destination::Font,
            "manifest" => Destination::Manifest,
            _ => Destination::Other,
        }
    }
}

// == Cache Mode ==
/// How the network fetcher treats intermediate HTTP caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Bypass intermediate caches and revalidate with the origin
    Reload,
}

// == Request Key ==
/// Cache identity of a request: method plus URL without fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method,
            url: url.into(),
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

// == Request ==
/// A resource request made by a controlled page.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub destination: Destination,
    pub cache_mode: CacheMode,
}

impl Request {
    /// Creates a request with the given method and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            destination: Destination::Empty,
            cache_mode: CacheMode::Default,
        }
    }

    /// Creates a plain GET request.
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a GET request for a full page navigation.
    pub fn navigate(url: Url) -> Self {
        Self::get(url).with_destination(Destination::Document)
    }

    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_cache_mode(mut self, cache_mode: CacheMode) -> Self {
        self.cache_mode = cache_mode;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: Bytes) -> Self {
        self.body = body;
        self
    }

    /// Returns the cache identity of this request.
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }

    pub fn is_navigation(&self) -> bool {
        self.destination == Destination::Document
    }
}

/// Returns true if both URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}
