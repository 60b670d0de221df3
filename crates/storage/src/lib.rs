//! Storage abstraction and implementations for PyChamp.
//!
//! Progress lives in named slots holding one serialized value each, the way a
//! browser keeps it under a local-storage key. This crate provides the slot
//! trait, a JSON file backend and an in-memory backend.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;

pub use trait_::{Storage, StorageError, Result};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
