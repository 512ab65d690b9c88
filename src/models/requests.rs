//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Request body for a notification click (POST /__sw/notifications/:id/click)
///
/// # Fields
/// - `action`: Action button clicked; omitted for a click on the body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationClickRequest {
    #[serde(default)]
    pub action: Option<String>,
}

impl NotificationClickRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.action {
            Some(action) if action.trim().is_empty() => {
                Some("Action cannot be empty; omit it for a body click".to_string())
            }
            _ => None,
        }
    }
}
