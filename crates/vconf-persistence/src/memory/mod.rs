// In-memory document store backend
// Keeps every service container in a concurrent map; nothing survives a restart

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use vconf_common::{ConfigVersion, VersionCounter};

use crate::traits::document::{DocumentStore, VersionScope, most_recently_read};

/// One service container: the counter record plus its version records
#[derive(Debug, Default)]
struct Collection {
    counter: Option<u64>,
    versions: BTreeMap<u64, ConfigVersion>,
}

/// Volatile document store
///
/// Each container sits behind its own map shard lock, which gives the
/// per-record atomicity the engine relies on.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Collection>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn collection_exists(&self, service: &str) -> anyhow::Result<bool> {
        Ok(self.collections.contains_key(service))
    }

    async fn create_collection(&self, service: &str) -> anyhow::Result<()> {
        match self.collections.entry(service.to_string()) {
            Entry::Occupied(_) => Err(anyhow::anyhow!(
                "collection '{}' already exists",
                service
            )),
            Entry::Vacant(entry) => {
                entry.insert(Collection::default());
                Ok(())
            }
        }
    }

    async fn insert_counter(&self, counter: VersionCounter) -> anyhow::Result<()> {
        let mut coll = self.collections.entry(counter.service.clone()).or_default();
        if coll.counter.is_some() {
            return Err(anyhow::anyhow!(
                "duplicate counter record for '{}'",
                counter.service
            ));
        }
        coll.counter = Some(counter.count);
        Ok(())
    }

    async fn fetch_increment_counter(&self, service: &str) -> anyhow::Result<Option<u64>> {
        let Some(mut coll) = self.collections.get_mut(service) else {
            return Ok(None);
        };
        Ok(coll.counter.as_mut().map(|count| {
            let current = *count;
            *count += 1;
            current
        }))
    }

    async fn insert_version(&self, record: ConfigVersion) -> anyhow::Result<()> {
        let mut coll = self.collections.entry(record.service.clone()).or_default();
        if coll.versions.contains_key(&record.version) {
            return Err(anyhow::anyhow!(
                "duplicate version {} for '{}'",
                record.version,
                record.service
            ));
        }
        coll.versions.insert(record.version, record);
        Ok(())
    }

    async fn find_and_touch(
        &self,
        service: &str,
        scope: VersionScope,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ConfigVersion>> {
        let Some(mut coll) = self.collections.get_mut(service) else {
            return Ok(None);
        };
        let record = match scope {
            VersionScope::All => coll.versions.values_mut().next_back(),
            VersionScope::Exact(version) => coll.versions.get_mut(&version),
        };
        Ok(record.map(|record| {
            record.last_read_at = Some(now);
            record.clone()
        }))
    }

    async fn find_most_recently_read(
        &self,
        service: &str,
        scope: VersionScope,
    ) -> anyhow::Result<Option<ConfigVersion>> {
        let Some(coll) = self.collections.get(service) else {
            return Ok(None);
        };
        let found = most_recently_read(coll.versions.values().filter(|r| scope.matches(r.version)));
        Ok(found.cloned())
    }

    async fn version_numbers(&self, service: &str) -> anyhow::Result<Vec<u64>> {
        Ok(self
            .collections
            .get(service)
            .map(|coll| coll.versions.keys().copied().collect())
            .unwrap_or_default())
    }

    async fn delete_version(&self, service: &str, version: u64) -> anyhow::Result<bool> {
        Ok(self
            .collections
            .get_mut(service)
            .map(|mut coll| coll.versions.remove(&version).is_some())
            .unwrap_or(false))
    }

    async fn drop_collection(&self, service: &str) -> anyhow::Result<()> {
        self.collections.remove(service);
        Ok(())
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.collections.clear();
        Ok(())
    }
}
