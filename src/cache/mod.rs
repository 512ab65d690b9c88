//! Cache Module
//!
//! Named, versioned stores of captured responses.

mod stats;
mod storage;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use stats::CacheStats;
pub use storage::{Cache, CacheStorage};
pub use store::CacheStore;
