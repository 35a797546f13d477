//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store's accounting and budget under arbitrary
//! operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::time::Duration;

use crate::cache::CacheStore;
use crate::test_support::sample_study;

// == Test Configuration ==
const TEST_MAX_BYTES: u64 = 4_096;
const TEST_MAX_AGE: Duration = Duration::from_secs(3600);

// == Strategies ==
/// Generates study ids from a small pool so operations collide
fn study_id_strategy() -> impl Strategy<Value = String> {
    "study-[0-9]{1,2}".prop_map(|s| s)
}

/// Generates entry sizes, some larger than the whole budget
fn size_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![8 => 1u64..1_200, 1 => 4_000u64..9_000]
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { key: String, size: u64 },
    Get { key: String },
    Clear,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        6 => (study_id_strategy(), size_strategy())
            .prop_map(|(key, size)| StoreOp::Put { key, size }),
        3 => study_id_strategy().prop_map(|key| StoreOp::Get { key }),
        1 => Just(StoreOp::Clear),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // *For any* sequence of operations, the accounted size SHALL stay within
    // budget, except when a single oversized entry is the sole occupant.
    #[test]
    fn prop_size_budget_enforced(ops in prop::collection::vec(store_op_strategy(), 1..80)) {
        let mut store = CacheStore::new(TEST_MAX_BYTES, TEST_MAX_AGE);

        for op in ops {
            match op {
                StoreOp::Put { key, size } => {
                    store.put(key.clone(), sample_study(&key), size);
                }
                StoreOp::Get { key } => {
                    let _ = store.get(&key);
                }
                StoreOp::Clear => {
                    store.clear();
                }
            }

            prop_assert!(
                store.total_size() <= TEST_MAX_BYTES || store.len() == 1,
                "size {} over budget with {} entries",
                store.total_size(),
                store.len()
            );
        }
    }

    // *For any* sequence of puts, `total_size` SHALL equal the sum of the sizes
    // of the entries still present, as tracked by a model map.
    #[test]
    fn prop_size_accounting_matches_model(
        puts in prop::collection::vec((study_id_strategy(), size_strategy()), 1..60)
    ) {
        let mut store = CacheStore::new(u64::MAX, TEST_MAX_AGE);
        let mut model: HashMap<String, u64> = HashMap::new();

        for (key, size) in puts {
            store.put(key.clone(), sample_study(&key), size);
            model.insert(key, size);
        }

        prop_assert_eq!(store.len(), model.len());
        prop_assert_eq!(store.total_size(), model.values().sum::<u64>());
        prop_assert_eq!(store.evictions(), 0);
    }

    // *For any* stored study, a get before expiry SHALL return the same study.
    #[test]
    fn prop_put_then_get(key in study_id_strategy(), size in 1u64..2_000) {
        let mut store = CacheStore::new(TEST_MAX_BYTES, TEST_MAX_AGE);
        let study = sample_study(&key);

        store.put(key.clone(), study.clone(), size);

        prop_assert_eq!(store.get(&key), Some(study));
    }

    // *For any* put, the newly inserted key SHALL be present afterwards, however
    // much had to be evicted to make room.
    #[test]
    fn prop_new_entry_always_admitted(
        fill in prop::collection::vec((study_id_strategy(), size_strategy()), 0..30),
        key in study_id_strategy(),
        size in size_strategy()
    ) {
        let mut store = CacheStore::new(TEST_MAX_BYTES, TEST_MAX_AGE);
        for (k, s) in fill {
            store.put(k.clone(), sample_study(&k), s);
        }

        store.put(key.clone(), sample_study(&key), size);

        prop_assert!(store.contains(&key));
    }

    // *For any* zero budget, the store SHALL never hold more than one entry.
    #[test]
    fn prop_zero_budget_single_entry(
        puts in prop::collection::vec((study_id_strategy(), 1u64..2_000), 1..30)
    ) {
        let mut store = CacheStore::new(0, TEST_MAX_AGE);
        for (key, size) in puts {
            store.put(key.clone(), sample_study(&key), size);
            prop_assert_eq!(store.len(), 1);
        }
    }
}
