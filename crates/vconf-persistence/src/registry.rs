//! Storage backend registry
//!
//! Maps the configured backend name onto a constructor so new backends can be
//! added without touching call sites.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::config::StorageConfig;
use crate::engine::StorageEngine;
use crate::memory::MemoryStore;
use crate::traits::ConfigStorage;

/// Constructor for one backend
pub type StorageFactory = fn(&StorageConfig) -> anyhow::Result<Arc<dyn ConfigStorage>>;

pub const BACKEND_MEMORY: &str = "memory";
pub const BACKEND_ROCKSDB: &str = "rocksdb";

pub struct StorageRegistry {
    factories: HashMap<String, StorageFactory>,
}

impl StorageRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every backend compiled into this build
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(BACKEND_MEMORY, open_memory);
        #[cfg(feature = "rocksdb")]
        registry.register(BACKEND_ROCKSDB, open_rocksdb);
        registry
    }

    /// Register a backend; a later registration under the same name wins
    pub fn register(&mut self, name: &str, factory: StorageFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Registered backend names, sorted
    pub fn backends(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Construct the backend named by `config.backend`
    pub fn open(&self, config: &StorageConfig) -> anyhow::Result<Arc<dyn ConfigStorage>> {
        let factory = self.factories.get(&config.backend).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown storage backend '{}', available: {}",
                config.backend,
                self.backends().join(", ")
            )
        })?;

        let storage = factory(config)?;
        info!(
            backend = storage.backend_name(),
            grace_window_ms = config.lifetime_ms,
            "storage backend opened"
        );
        Ok(storage)
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

fn open_memory(config: &StorageConfig) -> anyhow::Result<Arc<dyn ConfigStorage>> {
    Ok(Arc::new(StorageEngine::new(
        MemoryStore::new(),
        config.grace_window(),
    )))
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(config: &StorageConfig) -> anyhow::Result<Arc<dyn ConfigStorage>> {
    let store = crate::embedded::RocksDbStore::open(&config.rocksdb.path)?;
    Ok(Arc::new(StorageEngine::new(store, config.grace_window())))
}
