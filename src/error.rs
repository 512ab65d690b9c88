//! Error types for the offline cache worker
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Worker Error Enum ==
/// Unified error type for the worker and its host.
#[derive(Error, Debug)]
pub enum WorkerError {
    /// No cached entry and no network response for a request
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network fetch failed before a response was produced
    #[error("Network error: {0}")]
    Network(String),

    /// A manifest entry could not be pre-cached
    #[error("Manifest fetch failed for {url}: {reason}")]
    ManifestFetch { url: String, reason: String },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Lifecycle operation attempted from the wrong state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Push payload could not be parsed
    #[error("Invalid push payload: {0}")]
    PushPayload(#[from] serde_json::Error),

    /// Background sync routine rejected
    #[error("Sync failed: {0}")]
    Sync(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for WorkerError {
    fn into_response(self) -> Response {
        let status = match &self {
            WorkerError::NotFound(_) => StatusCode::NOT_FOUND,
            WorkerError::Network(_) => StatusCode::BAD_GATEWAY,
            WorkerError::ManifestFetch { .. } => StatusCode::BAD_GATEWAY,
            WorkerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            WorkerError::InvalidState(_) => StatusCode::CONFLICT,
            WorkerError::PushPayload(_) => StatusCode::BAD_REQUEST,
            WorkerError::Sync(_) => StatusCode::SERVICE_UNAVAILABLE,
            WorkerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the worker.
pub type Result<T> = std::result::Result<T, WorkerError>;
