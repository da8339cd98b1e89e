//! Cache module — the local mirror of vault and secret names.
//!
//! This module provides:
//! - The `CacheSnapshot` type and its JSON document form (`snapshot`)
//! - `CacheStore` for atomic load/save of the cache file (`store`)

pub mod snapshot;
pub mod store;

// Re-export the most commonly used items.
pub use snapshot::{CacheSnapshot, VaultEntry};
pub use store::CacheStore;
