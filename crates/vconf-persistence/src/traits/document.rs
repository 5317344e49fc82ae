//! Document store trait
//!
//! Models one version-history container (collection) per service, holding the
//! version records plus one counter record. Every method is atomic for the
//! single record it touches; nothing here spans records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use vconf_common::{ConfigVersion, LATEST_VERSION, VersionCounter};

/// Which version records an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionScope {
    /// Every version record of the service
    All,
    /// Exactly one version number
    Exact(u64),
}

impl VersionScope {
    /// `0` selects every version, anything else one exact version
    pub fn from_version(version: u64) -> Self {
        if version == LATEST_VERSION {
            VersionScope::All
        } else {
            VersionScope::Exact(version)
        }
    }

    pub fn matches(&self, version: u64) -> bool {
        match self {
            VersionScope::All => true,
            VersionScope::Exact(v) => *v == version,
        }
    }
}

/// Backing store operations used by the storage engine
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Registry name of the backend
    fn name(&self) -> &'static str;

    /// Whether a container exists for the service
    async fn collection_exists(&self, service: &str) -> anyhow::Result<bool>;

    /// Create an empty container; fails if one already exists
    async fn create_collection(&self, service: &str) -> anyhow::Result<()>;

    /// Insert the counter record of a service
    async fn insert_counter(&self, counter: VersionCounter) -> anyhow::Result<()>;

    /// Atomically increment the counter, returning the value it held before.
    ///
    /// Returns `None` when the service has no counter record.
    async fn fetch_increment_counter(&self, service: &str) -> anyhow::Result<Option<u64>>;

    /// Insert one version record
    async fn insert_version(&self, record: ConfigVersion) -> anyhow::Result<()>;

    /// Select the highest-numbered record in scope and stamp its
    /// `last_read_at` with `now` in the same record operation.
    async fn find_and_touch(
        &self,
        service: &str,
        scope: VersionScope,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ConfigVersion>>;

    /// Select the record in scope with the latest `last_read_at`.
    ///
    /// Records never read sort last but are still returned when nothing
    /// in scope was ever read.
    async fn find_most_recently_read(
        &self,
        service: &str,
        scope: VersionScope,
    ) -> anyhow::Result<Option<ConfigVersion>>;

    /// Version numbers currently stored for the service, ascending
    async fn version_numbers(&self, service: &str) -> anyhow::Result<Vec<u64>>;

    /// Delete one version record; returns whether it existed
    async fn delete_version(&self, service: &str, version: u64) -> anyhow::Result<bool>;

    /// Drop the whole container: every version record and the counter
    async fn drop_collection(&self, service: &str) -> anyhow::Result<()>;

    /// Release backend resources
    async fn close(&self) -> anyhow::Result<()>;
}

/// Pick the record with the latest read stamp, ties broken by highest version
pub(crate) fn most_recently_read<'a, I>(records: I) -> Option<&'a ConfigVersion>
where
    I: IntoIterator<Item = &'a ConfigVersion>,
{
    records
        .into_iter()
        .max_by(|a, b| (a.last_read_at, a.version).cmp(&(b.last_read_at, b.version)))
}
