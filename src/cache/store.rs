//! Cache Store Module
//!
//! Study storage bounded by a byte budget and a time-to-live, with LRU eviction.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::{lru, CacheEntry};
use crate::models::ImagingStudy;

// == Cache Store ==
/// Study storage with size-bounded LRU eviction and TTL expiry.
///
/// Invariant: `total_size` is the sum of every entry's `size_bytes` and never
/// exceeds `max_bytes` after a mutation, unless a single entry on its own is
/// larger than the budget.
#[derive(Debug)]
pub struct CacheStore {
    /// Study id -> entry
    entries: HashMap<String, CacheEntry>,
    /// Sum of accounted entry sizes
    total_size: u64,
    /// Size budget in bytes
    max_bytes: u64,
    /// Entry time-to-live
    max_age: Duration,
    /// Lifetime count of LRU evictions
    evictions: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store with the given byte budget and TTL.
    pub fn new(max_bytes: u64, max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            total_size: 0,
            max_bytes,
            max_age,
            evictions: 0,
        }
    }

    // == Get ==
    /// Returns a copy of the study stored under `key`.
    ///
    /// A hit refreshes the entry's last access time. An expired entry is removed
    /// and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<ImagingStudy> {
        let max_age = self.max_age;
        let expired = self.entries.get(key)?.is_expired(max_age);

        if expired {
            self.remove(key);
            debug!(study_id = key, "dropped expired entry on read");
            return None;
        }

        let entry = self.entries.get_mut(key)?;
        entry.touch();
        Some(entry.study.clone())
    }

    // == Put ==
    /// Stores `study` under `key`, evicting as needed to stay within budget.
    ///
    /// An existing entry for the key is replaced. Expired entries are dropped
    /// before any live entry is evicted. A study larger than the whole budget is
    /// kept as the sole occupant.
    ///
    /// Returns the number of live entries evicted.
    pub fn put(&mut self, key: String, study: ImagingStudy, size_bytes: u64) -> usize {
        self.remove(&key);

        if self.would_overflow(size_bytes) {
            self.purge_expired();
        }

        let mut evicted = 0;
        while self.would_overflow(size_bytes) {
            match self.evict_one() {
                Some(_) => evicted += 1,
                None => break,
            }
        }

        if size_bytes > self.max_bytes {
            debug!(
                study_id = %key,
                size_bytes,
                max_bytes = self.max_bytes,
                "storing oversized study as sole entry"
            );
        }

        self.total_size += size_bytes;
        self.entries.insert(key, CacheEntry::new(study, size_bytes));
        evicted
    }

    // == Contains ==
    /// Checks for a live entry without refreshing its access time.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.max_age))
    }

    // == Clear ==
    /// Removes every entry. Returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.total_size = 0;
        count
    }

    // == Purge Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Instant::now();
        let max_age = self.max_age;
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now, max_age))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove(key);
        }

        expired_keys.len()
    }

    // == Set Limits ==
    /// Applies a new budget and TTL, evicting immediately if now over budget.
    ///
    /// Returns the number of live entries evicted.
    pub fn set_limits(&mut self, max_bytes: u64, max_age: Duration) -> usize {
        self.max_bytes = max_bytes;
        self.max_age = max_age;

        if self.total_size > self.max_bytes {
            self.purge_expired();
        }

        let mut evicted = 0;
        while self.total_size > self.max_bytes && self.entries.len() > 1 {
            match self.evict_one() {
                Some(_) => evicted += 1,
                None => break,
            }
        }
        evicted
    }

    // == Accessors ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the accounted size of all entries in bytes.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Returns the lifetime number of LRU evictions.
    pub fn evictions(&self) -> u64 {
        self.evictions
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn would_overflow(&self, incoming: u64) -> bool {
        !self.entries.is_empty() && self.total_size.saturating_add(incoming) > self.max_bytes
    }

    fn evict_one(&mut self) -> Option<String> {
        let victim = lru::select_victim(&self.entries)?;
        self.remove(&victim);
        self.evictions += 1;
        debug!(study_id = %victim, "evicted least recently used study");
        Some(victim)
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.total_size -= entry.size_bytes;
        Some(entry)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_study;
    use std::thread::sleep;

    const HOUR: Duration = Duration::from_secs(3600);

    fn put(store: &mut CacheStore, id: &str, size: u64) -> usize {
        store.put(id.to_string(), sample_study(id), size)
    }

    #[test]
    fn test_store_new() {
        let store = CacheStore::new(10_000, HOUR);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = CacheStore::new(10_000, HOUR);

        put(&mut store, "study-1", 700);
        let study = store.get("study-1").unwrap();

        assert_eq!(study.id, "study-1");
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 700);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let mut store = CacheStore::new(10_000, HOUR);
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_get_returns_copy() {
        let mut store = CacheStore::new(10_000, HOUR);
        put(&mut store, "study-1", 700);

        let mut copy = store.get("study-1").unwrap();
        copy.attributes
            .insert("description".to_string(), "mutated by caller".into());

        let stored = store.get("study-1").unwrap();
        assert_ne!(stored.attribute("description"), copy.attribute("description"));
    }

    #[test]
    fn test_store_overwrite_releases_old_size() {
        let mut store = CacheStore::new(10_000, HOUR);

        put(&mut store, "study-1", 700);
        put(&mut store, "study-1", 900);

        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 900);
        assert_eq!(store.evictions(), 0);
    }

    #[test]
    fn test_store_ttl_expiration() {
        let mut store = CacheStore::new(10_000, Duration::from_millis(50));

        put(&mut store, "study-1", 700);
        assert!(store.get("study-1").is_some());

        sleep(Duration::from_millis(80));

        assert!(store.get("study-1").is_none());
        assert_eq!(store.len(), 0, "expired entry is removed on read");
        assert_eq!(store.total_size(), 0);
    }

    #[test]
    fn test_store_hit_does_not_extend_ttl() {
        let mut store = CacheStore::new(10_000, Duration::from_millis(60));

        put(&mut store, "study-1", 700);
        sleep(Duration::from_millis(40));
        assert!(store.get("study-1").is_some());
        sleep(Duration::from_millis(40));

        assert!(store.get("study-1").is_none());
    }

    #[test]
    fn test_store_lru_eviction() {
        let mut store = CacheStore::new(2_000, HOUR);

        put(&mut store, "study-1", 600);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-2", 600);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-3", 600);
        sleep(Duration::from_millis(2));

        // 1800 + 600 > 2000, study-1 is least recently used
        let evicted = put(&mut store, "study-4", 600);

        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 3);
        assert!(store.total_size() <= 2_000);
        assert!(!store.contains("study-1"));
        assert!(store.contains("study-2"));
        assert!(store.contains("study-4"));
    }

    #[test]
    fn test_store_lru_touch_on_get() {
        let mut store = CacheStore::new(2_000, HOUR);

        put(&mut store, "study-1", 600);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-2", 600);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-3", 600);
        sleep(Duration::from_millis(2));

        // Access study-1 to make it most recently used
        store.get("study-1").unwrap();
        sleep(Duration::from_millis(2));

        put(&mut store, "study-4", 600);

        assert!(store.contains("study-1"));
        assert!(!store.contains("study-2"));
    }

    #[test]
    fn test_store_evicts_several_for_large_entry() {
        let mut store = CacheStore::new(2_000, HOUR);

        put(&mut store, "study-1", 600);
        put(&mut store, "study-2", 600);
        put(&mut store, "study-3", 600);

        let evicted = put(&mut store, "study-big", 1_500);

        assert_eq!(evicted, 3);
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 1_500);
        assert_eq!(store.evictions(), 3);
    }

    #[test]
    fn test_store_oversized_entry_is_sole_occupant() {
        let mut store = CacheStore::new(1_000, HOUR);

        put(&mut store, "study-1", 600);
        put(&mut store, "study-huge", 5_000);

        assert_eq!(store.len(), 1);
        assert!(store.contains("study-huge"));
        assert!(store.get("study-huge").is_some());
    }

    #[test]
    fn test_store_zero_budget_keeps_one_entry() {
        let mut store = CacheStore::new(0, HOUR);

        put(&mut store, "study-1", 700);
        assert_eq!(store.len(), 1);

        put(&mut store, "study-2", 700);
        assert_eq!(store.len(), 1);
        assert!(store.contains("study-2"));
        assert!(!store.contains("study-1"));
    }

    #[test]
    fn test_store_prefers_expired_over_live_eviction() {
        let mut store = CacheStore::new(1_500, Duration::from_millis(50));

        put(&mut store, "study-old", 700);
        sleep(Duration::from_millis(80));

        put(&mut store, "study-new", 700);
        put(&mut store, "study-newer", 700);

        assert_eq!(store.evictions(), 0, "expired entry is purged, not evicted");
        assert!(store.contains("study-new"));
        assert!(store.contains("study-newer"));
    }

    #[test]
    fn test_store_clear() {
        let mut store = CacheStore::new(10_000, HOUR);
        put(&mut store, "study-1", 700);
        put(&mut store, "study-2", 700);

        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.total_size(), 0);
        assert!(store.get("study-1").is_none());
    }

    #[test]
    fn test_store_purge_expired() {
        let mut store = CacheStore::new(10_000, Duration::from_millis(50));

        put(&mut store, "study-1", 700);
        sleep(Duration::from_millis(80));
        put(&mut store, "study-2", 700);

        let removed = store.purge_expired();
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.total_size(), 700);
        assert!(store.get("study-2").is_some());
    }

    #[test]
    fn test_store_set_limits_shrinks() {
        let mut store = CacheStore::new(10_000, HOUR);
        put(&mut store, "study-1", 700);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-2", 700);
        sleep(Duration::from_millis(2));
        put(&mut store, "study-3", 700);

        let evicted = store.set_limits(1_500, HOUR);

        assert_eq!(evicted, 1);
        assert_eq!(store.len(), 2);
        assert!(!store.contains("study-1"));
        assert_eq!(store.max_bytes(), 1_500);
    }
}
