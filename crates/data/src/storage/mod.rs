//! In-memory stores.
//!
//! `MemoryStore` holds the collection and the lock; `IdentifiableMemoryStore`
//! adds id-addressed operations on top of it.

pub mod memory_store;
pub mod identifiable_memory_store;
