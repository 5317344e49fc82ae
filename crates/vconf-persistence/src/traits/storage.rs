//! Config storage capability trait
//!
//! This is the interface the gateway holds. Implementations own the
//! versioning semantics; the backing store behind them is pluggable.

use async_trait::async_trait;
use vconf_common::{ConfigVersion, StorageResult};

/// Versioned config storage operations
#[async_trait]
pub trait ConfigStorage: Send + Sync {
    /// Create version 1 of a new service
    async fn create(&self, service: &str, payload: &[u8]) -> StorageResult<()>;

    /// Read one version, `0` meaning latest; stamps the record's read time
    async fn read(&self, service: &str, version: u64) -> StorageResult<ConfigVersion>;

    /// Append a new version, returning its number
    async fn update(&self, service: &str, payload: &[u8]) -> StorageResult<u64>;

    /// Delete one version, or the whole history for `0`
    async fn delete(&self, service: &str, version: u64) -> StorageResult<()>;

    /// Release the backing store
    async fn close(&self) -> StorageResult<()>;

    /// Name of the backing store, for logs
    fn backend_name(&self) -> &'static str;
}
