//! Cache Entry Module
//!
//! A cached study plus the bookkeeping the store needs for TTL and LRU.

use std::time::{Duration, Instant};

use crate::models::ImagingStudy;

// == Cache Entry ==
/// Represents a single cached study with its accounting metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached study
    pub study: ImagingStudy,
    /// Accounted size in bytes
    pub size_bytes: u64,
    /// Insertion time
    pub cached_at: Instant,
    /// Last time the entry was returned as a hit (or inserted)
    pub last_accessed_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(study: ImagingStudy, size_bytes: u64) -> Self {
        let now = Instant::now();
        Self {
            study,
            size_bytes,
            cached_at: now,
            last_accessed_at: now,
        }
    }

    // == Is Expired ==
    /// Checks if the entry is older than `max_age`.
    ///
    /// Boundary condition: an entry whose age equals `max_age` is expired, so a
    /// zero `max_age` expires every entry immediately.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.is_expired_at(Instant::now(), max_age)
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock reading.
    pub fn is_expired_at(&self, now: Instant, max_age: Duration) -> bool {
        now.saturating_duration_since(self.cached_at) >= max_age
    }

    // == Touch ==
    /// Marks the entry as just accessed.
    pub fn touch(&mut self) {
        self.last_accessed_at = Instant::now();
    }

    /// Time since insertion.
    pub fn age(&self) -> Duration {
        self.cached_at.elapsed()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_study;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(sample_study("study-1"), 700);

        assert_eq!(entry.study.id, "study-1");
        assert_eq!(entry.size_bytes, 700);
        assert_eq!(entry.cached_at, entry.last_accessed_at);
        assert!(!entry.is_expired(Duration::from_secs(60)));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(sample_study("study-1"), 700);
        let max_age = Duration::from_millis(50);

        assert!(!entry.is_expired(max_age));

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired(max_age));
        assert!(entry.age() >= max_age);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(sample_study("study-1"), 700);
        let max_age = Duration::from_secs(10);

        assert!(!entry.is_expired_at(entry.cached_at + Duration::from_secs(9), max_age));
        assert!(entry.is_expired_at(entry.cached_at + max_age, max_age));
        assert!(entry.is_expired(Duration::ZERO), "zero TTL expires immediately");
    }

    #[test]
    fn test_touch_advances_last_access() {
        let mut entry = CacheEntry::new(sample_study("study-1"), 700);
        let before = entry.last_accessed_at;

        sleep(Duration::from_millis(2));
        entry.touch();

        assert!(entry.last_accessed_at > before);
        assert_eq!(entry.cached_at, before, "touch must not reset the TTL clock");
    }
}
