//! API Module
//!
//! HTTP surface of the worker host: admin endpoints under `/__sw` and a
//! fallback that routes every other request through fetch interception.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::{create_router, ADMIN_PREFIX};
