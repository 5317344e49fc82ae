//! Storage configuration
//!
//! Deserialized from the `storage` section of the server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use vconf_common::DEFAULT_GRACE_WINDOW_MS;

/// Backend selection and engine tuning
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Registry name of the backing store
    pub backend: String,
    /// Delete-safety grace window in milliseconds
    pub lifetime_ms: u64,
    pub rocksdb: RocksDbConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            lifetime_ms: DEFAULT_GRACE_WINDOW_MS,
            rocksdb: RocksDbConfig::default(),
        }
    }
}

impl StorageConfig {
    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.lifetime_ms)
    }
}

/// Embedded RocksDB settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDbConfig {
    pub path: String,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/vconf".to_string(),
        }
    }
}
