use std::sync::Arc;
use std::thread;

use keeldb::trie::TrieStore;

#[test]
fn test_put_get_remove() {
    let store = TrieStore::new();

    store.put("alpha", 1u32);
    store.put("beta", "two".to_string());

    assert_eq!(store.get::<u32>("alpha").map(|g| *g), Some(1));
    assert_eq!(
        store.get::<String>("beta").map(|g| g.value().clone()),
        Some("two".to_string())
    );
    assert!(store.get::<u32>("gamma").is_none());

    store.remove("alpha");
    assert!(store.get::<u32>("alpha").is_none());
    assert!(store.get::<String>("beta").is_some());
}

#[test]
fn test_overwrite() {
    let store = TrieStore::new();

    store.put("key", 1u32);
    store.put("key", 2u32);

    assert_eq!(store.get::<u32>("key").map(|g| *g), Some(2));
}

#[test]
fn test_type_mismatch() {
    let store = TrieStore::new();
    store.put("key", 7u32);

    assert!(store.get::<u64>("key").is_none());
    assert_eq!(store.get::<u32>("key").map(|g| *g), Some(7));
}

#[test]
fn test_guard_outlives_removal() {
    let store = TrieStore::new();
    store.put("key", 41u32);

    let guard = store.get::<u32>("key").unwrap();

    // The writer returns before the reader lets go of its snapshot
    store.remove("key");
    assert!(store.get::<u32>("key").is_none());

    // The guard still reads the pre-removal value
    assert_eq!(*guard, 41);
}

#[test]
fn test_guard_outlives_overwrite() {
    let store = TrieStore::new();
    store.put("key", "before".to_string());

    let guard = store.get::<String>("key").unwrap();
    store.put("key", "after".to_string());

    assert_eq!(guard.value(), "before");
    assert_eq!(
        store.get::<String>("key").map(|g| g.value().clone()),
        Some("after".to_string())
    );
}

#[test]
fn test_concurrent_readers_and_writers() {
    let store = Arc::new(TrieStore::new());
    store.put("stable", 7u32);

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..100u32 {
                    let key = format!("w{}-{}", w, i);
                    store.put(key.as_str(), i);
                    if i % 3 == 0 {
                        store.remove(key.as_str());
                    }
                }
            })
        })
        .collect();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    // The stable key is never removed; every snapshot must
                    // contain it.
                    let guard = store.get::<u32>("stable").expect("stable key vanished");
                    assert_eq!(*guard, 7);
                }
            })
        })
        .collect();

    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }

    // Writers were serialized, so their surviving keys are all visible
    for w in 0..4 {
        for i in 0..100u32 {
            let key = format!("w{}-{}", w, i);
            let value = store.get::<u32>(key.as_str()).map(|g| *g);
            if i % 3 == 0 {
                assert_eq!(value, None);
            } else {
                assert_eq!(value, Some(i));
            }
        }
    }
}

#[test]
fn test_mixed_value_types() {
    let store = TrieStore::new();

    store.put("count", 3u64);
    store.put("blob", vec![0u8; 16]);
    store.put("flagged", Box::new(true));

    assert_eq!(store.get::<u64>("count").map(|g| *g), Some(3));
    assert_eq!(store.get::<Vec<u8>>("blob").map(|g| g.len()), Some(16));
    assert_eq!(store.get::<Box<bool>>("flagged").map(|g| **g.value()), Some(true));
}
