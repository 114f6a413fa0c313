use std::any::Any;
use std::ops::Deref;
use std::sync::Arc;

use parking_lot::Mutex;

use super::trie::Trie;

/// Keeps a trie snapshot alive for as long as a looked-up value is in use.
/// Concurrent writers swap the store's root freely; the guarded value stays
/// valid until the guard is dropped.
pub struct ValueGuard<T> {
    _root: Trie,
    value: Arc<T>,
}

impl<T> ValueGuard<T> {
    pub fn value(&self) -> &T {
        &self.value
    }
}

impl<T> Deref for ValueGuard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

/// Concurrent facade over a persistent [`Trie`]: readers take a snapshot of
/// the current root and search it without holding any lock; writers are
/// serialized and publish a new root with a single pointer swap.
pub struct TrieStore {
    /// Guards loads and stores of the root pointer only.
    root: Mutex<Trie>,
    /// Serializes the read-modify-publish sequence across writers.
    write_lock: Mutex<()>,
}

impl TrieStore {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(Trie::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Read `key` from the current snapshot.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<ValueGuard<T>> {
        let snapshot = self.root.lock().clone();
        let value = snapshot.get_value(key)?;
        let value = value.downcast::<T>().ok()?;
        Some(ValueGuard {
            _root: snapshot,
            value,
        })
    }

    /// Map `key` to `value` in a new published root
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let new_root = snapshot.put(key, value);
        *self.root.lock() = new_root;
    }

    /// Unmap `key` in a new published root
    pub fn remove(&self, key: &str) {
        let _writer = self.write_lock.lock();
        let snapshot = self.root.lock().clone();
        let new_root = snapshot.remove(key);
        *self.root.lock() = new_root;
    }
}

impl Default for TrieStore {
    fn default() -> Self {
        Self::new()
    }
}
