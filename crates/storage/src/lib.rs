//! Checkpoint storage for Echo-Self.
//!
//! This crate provides a trait-based blob store for engine checkpoints with
//! a file-system implementation (atomic replace) and an in-memory
//! implementation.

#![warn(missing_docs)]

pub mod trait_;
pub mod file_store;
pub mod memory_store;

pub use trait_::{CheckpointStore, StorageError, Result};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
