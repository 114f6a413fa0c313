mod lru_k;

pub use lru_k::LRUKReplacer;
pub use lru_k::ReplacerError;
