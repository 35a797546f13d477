//! Imaging Cache - study metadata cache for the patient portal
//!
//! Serves imaging-study lookups from a size-bounded, TTL-limited LRU cache in
//! front of the remote imaging API, with bounded retries, in-flight request
//! deduplication, background prefetch of related studies and hit-rate metrics.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod service;
pub mod tasks;

#[cfg(test)]
mod test_support;

pub use api::AppState;
pub use config::{CacheConfig, Config, PartialCacheConfig};
pub use error::{ErrorKind, ImagingError, Result};
pub use service::ImagingCacheService;
pub use tasks::spawn_cleanup_task;
