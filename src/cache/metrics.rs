//! Cache Metrics Module
//!
//! Lifetime request/hit counters and the snapshot handed to callers.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Metrics Snapshot ==
/// Point-in-time view of cache performance. Owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Lookups served since the service was created
    pub total_requests: u64,
    /// Lookups answered from the cache
    pub cache_hits: u64,
    /// `cache_hits / total_requests`, 0 when there were no requests
    pub cache_hit_rate: f64,
    /// Entries currently cached
    pub total_cached_studies: usize,
    /// Accounted bytes currently cached
    pub cache_size_bytes: u64,
    /// Entries evicted to honour the size budget
    pub evictions: u64,
}

// == Metrics Collector ==
/// Lock-free hit/request counters.
///
/// Counters only grow; clearing the cache leaves them untouched.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_requests: AtomicU64,
    cache_hits: AtomicU64,
}

impl MetricsCollector {
    // == Constructor ==
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Request ==
    /// Counts one lookup, and a hit if `was_hit`.
    pub fn record_request(&self, was_hit: bool) {
        self.total_requests.fetch_add(1, Ordering::Release);
        if was_hit {
            self.cache_hits.fetch_add(1, Ordering::Release);
        }
    }

    // == Snapshot ==
    /// Returns a copy of the counters with the hit rate derived.
    ///
    /// Store-derived fields are left at zero for the caller to fill in.
    pub fn snapshot(&self) -> Metrics {
        // Hits are loaded first: a request recorded between the two loads
        // then only raises the total, keeping hits <= total.
        let cache_hits = self.cache_hits.load(Ordering::Acquire);
        let total_requests = self.total_requests.load(Ordering::Acquire);

        Metrics {
            total_requests,
            cache_hits,
            cache_hit_rate: hit_rate(cache_hits, total_requests),
            ..Metrics::default()
        }
    }
}

/// Returns `hits / total` clamped to 1.0, or 0.0 if there were no requests.
pub fn hit_rate(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (hits as f64 / total as f64).min(1.0)
    }
}
