use std::any::Any;
use std::sync::Arc;

use super::node::{TrieNode, TrieNodePtr, ValuePtr};

/// A persistent copy-on-write trie keyed by strings.
///
/// Every mutation returns a new handle; all subtrees off the modified
/// root-to-leaf path are shared with the predecessor, so old handles keep
/// reading their own snapshot. Values are heterogeneous: each key may store
/// a different type, recovered by downcast on lookup.
#[derive(Clone, Default)]
pub struct Trie {
    root: TrieNodePtr,
}

impl Trie {
    /// An empty trie
    pub fn new() -> Self {
        Self {
            root: Arc::new(TrieNode::default()),
        }
    }

    /// Look up `key`. Returns `None` when the key is absent or when the
    /// stored value is not a `T`.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        let node = self.find_node(key)?;
        node.value()?.downcast_ref::<T>()
    }

    /// Produce a trie in which `key` maps to `value`, replacing any
    /// existing value. Move-only types are supported; the value is never
    /// cloned.
    pub fn put<T: Any + Send + Sync>(&self, key: &str, value: T) -> Trie {
        let chars: Vec<char> = key.chars().collect();
        let value: ValuePtr = Arc::new(value);
        let root = Self::put_node(&self.root, &chars, value);
        Trie {
            root: Arc::new(root),
        }
    }

    /// Produce a trie in which `key` is unmapped. Nodes left without a
    /// value and without children are pruned from the touched path. When
    /// the key is absent the result shares the entire tree.
    pub fn remove(&self, key: &str) -> Trie {
        let chars: Vec<char> = key.chars().collect();
        match Self::remove_node(&self.root, &chars) {
            None => Trie {
                root: Arc::clone(&self.root),
            },
            Some(Some(root)) => Trie { root },
            Some(None) => Trie::new(),
        }
    }

    pub(crate) fn get_value(&self, key: &str) -> Option<ValuePtr> {
        let node = self.find_node(key)?;
        node.value().cloned()
    }

    fn find_node(&self, key: &str) -> Option<&TrieNodePtr> {
        let mut node = &self.root;
        for c in key.chars() {
            node = node.child(c)?;
        }
        Some(node)
    }

    fn put_node(node: &TrieNode, key: &[char], value: ValuePtr) -> TrieNode {
        match key.split_first() {
            // Terminal: a value node over the existing children, so keys
            // prefixed by this one survive.
            None => TrieNode::with_value(node.children().clone(), value),
            Some((&c, rest)) => {
                let child = match node.child(c) {
                    Some(existing) => Self::put_node(existing, rest, value),
                    None => Self::put_node(&TrieNode::default(), rest, value),
                };
                let mut new_node = node.clone();
                new_node.set_child(c, Arc::new(child));
                new_node
            }
        }
    }

    /// `None`: key not present, no structural change. `Some(None)`: the
    /// node pruned away entirely. `Some(Some(n))`: the node replaced by `n`.
    fn remove_node(node: &TrieNode, key: &[char]) -> Option<Option<TrieNodePtr>> {
        match key.split_first() {
            None => {
                if !node.is_value_node() {
                    return None;
                }
                if node.has_children() {
                    Some(Some(Arc::new(TrieNode::new(node.children().clone()))))
                } else {
                    Some(None)
                }
            }
            Some((&c, rest)) => {
                let child = node.child(c)?;
                let replacement = Self::remove_node(child, rest)?;

                let mut new_node = node.clone();
                match replacement {
                    Some(new_child) => new_node.set_child(c, new_child),
                    None => new_node.remove_child(c),
                }

                if !new_node.is_value_node() && !new_node.has_children() {
                    Some(None)
                } else {
                    Some(Some(Arc::new(new_node)))
                }
            }
        }
    }
}
