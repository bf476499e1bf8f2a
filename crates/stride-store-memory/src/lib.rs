//! In-memory backend for the Stride goal store.
//!
//! A map-of-maps keyed by user then entity id, guarded by a single
//! reader/writer lock. Mutations hold the write guard for their full
//! duration; composite reads (dashboard, stats) take one read guard so
//! no caller ever observes a half-applied write.

mod store;

pub use store::MemoryStore;
