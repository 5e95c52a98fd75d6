//! Persistence: a storage port, its backends, and versioned whole-value state.
//!
//! Stores keep a pure state value and hand it to [`Persisted`], which loads it
//! on open and writes it after every mutation. Backends only move bytes.

mod envelope;
mod storage;

pub use envelope::{decode_state, encode_state, PersistentState, Persisted};
pub use storage::{FileStorage, FileStorageConfig, MemoryStorage, StoragePort};
