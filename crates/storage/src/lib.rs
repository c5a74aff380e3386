//! Local persistence for PathTrack progress documents.
//!
//! This crate provides a trait-based store interface with a JSON file
//! implementation, an in-memory fake, and the [`LocalProgressStore`]
//! adapter that turns persistence failures into in-memory-only operation.

#![warn(missing_docs)]

pub mod trait_;
pub mod json_storage;
pub mod memory;
pub mod local;

pub use trait_::{ProgressStore, StoreError, Result, DEFAULT_STORAGE_KEY};
pub use json_storage::JsonFileStore;
pub use memory::MemoryStore;
pub use local::LocalProgressStore;
