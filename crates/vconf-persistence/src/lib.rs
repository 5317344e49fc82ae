//! vconf Persistence - Versioned config storage
//!
//! This crate provides:
//! - The `DocumentStore` capability trait over a document-oriented backing store
//! - An in-memory backend and an embedded RocksDB backend (feature `rocksdb`)
//! - The storage engine owning versioning, create-once and delete-safety semantics
//! - The per-service version allocator
//! - A registry mapping a backend name to a storage constructor

pub mod allocator;
pub mod config;
#[cfg(feature = "rocksdb")]
pub mod embedded;
pub mod engine;
pub mod memory;
pub mod registry;
pub mod traits;

pub use allocator::VersionAllocator;
pub use config::{RocksDbConfig, StorageConfig};
#[cfg(feature = "rocksdb")]
pub use embedded::RocksDbStore;
pub use engine::StorageEngine;
pub use memory::MemoryStore;
pub use registry::{StorageFactory, StorageRegistry};
pub use traits::{ConfigStorage, DocumentStore, VersionScope};
