//! Cache Module
//!
//! Size-bounded study storage with TTL expiration, LRU eviction and hit metrics.

mod entry;
mod lru;
mod metrics;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::select_victim;
pub use metrics::{hit_rate, Metrics, MetricsCollector};
pub use store::CacheStore;
