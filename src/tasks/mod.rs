//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the host is up.
//!
//! # Tasks
//! - Background sync: fires pending sync registrations and retries failures

mod sync;

pub use sync::{run_sync_round, spawn_sync_task};
