//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Key/value storage (LocalStorage on web, files natively, memory in tests)
//! - The JS-facing game facade (wasm32 only)

pub mod storage;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use storage::{MemoryStorage, Storage, StorageError};

#[cfg(not(target_arch = "wasm32"))]
pub use storage::FileStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
