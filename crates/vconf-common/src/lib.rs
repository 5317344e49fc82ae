//! vconf Common - Shared types, errors, and utilities
//!
//! This crate provides the foundational types used across all vconf components:
//! - The storage error taxonomy
//! - The versioned config data model and the request envelope
//! - Payload and service-name validation helpers
//! - Common constants

pub mod error;
pub mod model;
pub mod utils;

// Re-exports for convenience
pub use error::{StorageError, StorageResult};
pub use model::{ConfigVersion, RequestData, VersionCounter};
pub use utils::{is_valid_payload, validate_service};

/// Path the gateway serves all four config operations on
pub const CONFIG_PATH: &str = "/config";

/// Version value meaning "latest" on reads and "whole history" on deletes
pub const LATEST_VERSION: u64 = 0;

/// Version number written directly by a create call
pub const FIRST_VERSION: u64 = 1;

/// Counter value a freshly created service starts with
pub const COUNTER_SEED: u64 = 2;

/// Default delete-safety grace window in milliseconds
pub const DEFAULT_GRACE_WINDOW_MS: u64 = 10_000;

/// Query parameter names
pub const SERVICE: &str = "service";
pub const VERSION: &str = "version";

/// Content type of stored payloads
pub const CONTENT_TYPE_JSON: &str = "application/json";
