//! Persistence traits for the storage abstraction layer
//!
//! Two levels are defined here:
//! - `DocumentStore`: per-record atomic primitives a backing store must offer
//! - `ConfigStorage`: the create/read/update/delete/close capability the
//!   gateway depends on, implemented by the storage engine

pub mod document;
pub mod storage;

pub use document::{DocumentStore, VersionScope};
pub use storage::ConfigStorage;
