//! Persistent memory for Conductor tool clients.
//!
//! Values are JSON, stored under a unique key with a category, an optional
//! expiry time, an optional session id and free-form metadata. Expired
//! entries are invisible to reads and removed by
//! [`MemoryStore::cleanup_expired`].

/// Entry, session and statistics types.
pub mod entry;
/// The store trait and its SQLite implementation.
pub mod store;

pub use entry::{
    MemoryEntry, MemoryStats, NewMemory, Session, ValueType, DEFAULT_CATEGORY, KNOWN_CATEGORIES,
};
pub use store::{MemoryStore, SqliteMemoryStore};
