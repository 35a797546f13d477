//! LRU Victim Selection
//!
//! Picks the entry to evict when the store is over budget.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Select Victim ==
/// Returns the key of the least recently accessed entry.
///
/// Entries with equal `last_accessed_at` are ordered by key, so the smaller key
/// goes first. Returns None if there are no entries.
pub fn select_victim(entries: &HashMap<String, CacheEntry>) -> Option<String> {
    entries
        .iter()
        .min_by(|(ka, a), (kb, b)| {
            a.last_accessed_at
                .cmp(&b.last_accessed_at)
                .then_with(|| ka.cmp(kb))
        })
        .map(|(key, _)| key.clone())
}
