//! Eviction policy implementations

mod lru;

pub use lru::LruPolicy;
