//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store bookkeeping and version rotation.

use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap};

use axum::http::Method;
use url::Url;

use crate::cache::{CacheStorage, CacheStore};
use crate::fetch::{Request, Response};
use crate::worker::evict_stale_stores;

// == Strategies ==
/// Generates request paths under the test scope
fn path_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}(\\.(html|js|css|png))?".prop_map(|s| s)
}

/// Generates response bodies
fn body_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 <>/]{0,64}".prop_map(|s| s)
}

/// Generates versioned store names
fn store_name_strategy() -> impl Strategy<Value = String> {
    (0u8..5, 0u8..10, 0u8..10).prop_map(|(a, b, c)| format!("synapse-game-v{}.{}.{}", a, b, c))
}

#[derive(Debug, Clone)]
enum StoreOp {
    Put { path: String, body: String },
    Match { path: String },
    Delete { path: String },
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        (path_strategy(), body_strategy()).prop_map(|(path, body)| StoreOp::Put { path, body }),
        path_strategy().prop_map(|path| StoreOp::Match { path }),
        path_strategy().prop_map(|path| StoreOp::Delete { path }),
    ]
}

fn request(method: Method, path: &str) -> Request {
    let url = Url::parse("http://localhost:8080/").unwrap().join(path).unwrap();
    Request::new(method, url)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations the store behaves like a map from
    // request URL to the last body put, and the counters match the outcomes.
    #[test]
    fn prop_store_matches_model(ops in prop::collection::vec(store_op_strategy(), 1..50)) {
        let mut store = CacheStore::new("v1");
        let mut model: HashMap<String, String> = HashMap::new();
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                StoreOp::Put { path, body } => {
                    store.put(&request(Method::GET, &path), Response::ok(body.clone())).unwrap();
                    model.insert(path, body);
                }
                StoreOp::Match { path } => {
                    let found = store.match_request(&request(Method::GET, &path));
                    match model.get(&path) {
                        Some(body) => {
                            expected_hits += 1;
                            prop_assert_eq!(found.map(|r| r.text()), Some(body.clone()));
                        }
                        None => {
                            expected_misses += 1;
                            prop_assert!(found.is_none());
                        }
                    }
                }
                StoreOp::Delete { path } => {
                    let removed = store.delete(&request(Method::GET, &path));
                    prop_assert_eq!(removed, model.remove(&path).is_some());
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits);
        prop_assert_eq!(stats.misses, expected_misses);
        prop_assert_eq!(stats.total_entries, model.len());
        prop_assert_eq!(store.keys().len(), model.len());
    }

    // Non-GET requests are never stored, whatever else happens.
    #[test]
    fn prop_non_get_never_stored(
        paths in prop::collection::vec(path_strategy(), 1..20),
        method in prop_oneof![Just(Method::POST), Just(Method::PUT), Just(Method::DELETE)],
    ) {
        let mut store = CacheStore::new("v1");

        for path in &paths {
            prop_assert!(store.put(&request(method.clone(), path), Response::ok("x")).is_err());
        }

        prop_assert!(store.is_empty());
    }

    // Eviction leaves exactly one store, the current one, regardless of how
    // many versions existed, and reports one deletion per stale name.
    #[test]
    fn prop_rotation_leaves_only_current(
        old in prop::collection::vec(store_name_strategy(), 0..10),
        current in store_name_strategy(),
    ) {
        let (deleted, remaining) = tokio_test::block_on(async {
            let storage = CacheStorage::new();
            for name in &old {
                storage.open(name).await;
            }
            storage.open(&current).await;

            let deleted = evict_stale_stores(&storage, &current).await.unwrap();
            (deleted, storage.keys().await.unwrap())
        });

        let stale: BTreeSet<&String> = old.iter().filter(|name| **name != current).collect();
        prop_assert_eq!(deleted, stale.len());
        prop_assert_eq!(remaining, vec![current]);
    }
}
