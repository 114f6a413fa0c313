// Export public modules
pub mod common;
pub mod storage;
pub mod trie;

// Re-export key items for convenient access
pub use storage::buffer::BufferPoolManager;
pub use storage::buffer::BufferPoolError;
pub use storage::page::{BasicPageGuard, ReadPageGuard, WritePageGuard};
pub use trie::{Trie, TrieStore};
