use std::sync::Arc;

use anyhow::Result;

use keeldb::storage::buffer::BufferPoolManager;
use keeldb::trie::TrieStore;

fn main() -> Result<()> {
    env_logger::init();

    // Create a database file path
    let db_path = "database.db";

    // Create buffer pool manager (1000 pages, LRU-2 replacement)
    let buffer_pool = Arc::new(BufferPoolManager::new(1000, 2, db_path)?);
    println!("Buffer pool manager initialized successfully");

    // Create a page and write to it through a write guard
    let (page_id, guard) = buffer_pool.new_page_guarded()?;
    {
        let mut writer = guard.upgrade_write();
        writer.data_mut()[..11].copy_from_slice(b"hello pages");
    }
    println!("Created page {}", page_id);

    // Read it back through a read guard
    {
        let reader = buffer_pool.fetch_page_read(page_id)?;
        let prefix = String::from_utf8_lossy(&reader.data()[..11]);
        println!("Page {} starts with {:?}", page_id, prefix);
    }

    buffer_pool.flush_all_pages()?;
    println!("All pages flushed to {}", db_path);

    // The trie store is an in-memory structure, independent of the pool
    let store = TrieStore::new();
    store.put("answer", 42u32);
    store.put("greeting", "hello".to_string());

    if let Some(answer) = store.get::<u32>("answer") {
        println!("answer = {}", *answer);
    }
    if let Some(greeting) = store.get::<String>("greeting") {
        println!("greeting = {}", greeting.value());
    }

    Ok(())
}
