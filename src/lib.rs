//! Offline Cache - a service worker host for an offline-capable web game
//!
//! Pre-caches the app shell on install, evicts outdated cache versions on
//! activate, and answers requests cache-first with an offline fallback.
//! Push messages, notification clicks and background sync are delivered
//! to the worker through the admin API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod host;
pub mod models;
pub mod tasks;
pub mod worker;

pub use api::AppState;
pub use config::Config;
pub use error::{Result, WorkerError};
pub use tasks::spawn_sync_task;
pub use worker::{ServiceWorker, WorkerState};
