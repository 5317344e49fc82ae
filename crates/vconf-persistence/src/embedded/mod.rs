// Embedded persistence backend using RocksDB
// Provides standalone (single-node) storage without an external database

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use vconf_common::{ConfigVersion, VersionCounter};

use crate::traits::document::{DocumentStore, VersionScope, most_recently_read};

/// Column family holding one counter record per service, keyed by service
pub const CF_COUNTERS: &str = "counters";
/// Column family holding version records, keyed by service and version
pub const CF_VERSIONS: &str = "versions";

const KEY_SEPARATOR: char = '\0';

/// Standalone embedded document store using RocksDB
///
/// Values are JSON documents. RocksDB has no read-modify-write primitive for
/// arbitrary documents, so record mutations are serialized through one
/// process-local lock; each still touches a single record.
pub struct RocksDbStore {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl RocksDbStore {
    /// Open (or create) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cfs = vec![
            ColumnFamilyDescriptor::new(CF_COUNTERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_VERSIONS, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cfs)
            .map_err(|e| anyhow::anyhow!("RocksDB open error: {}", e))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle
    fn cf(&self, name: &str) -> anyhow::Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow::anyhow!("Column family '{}' not found", name))
    }

    fn check_service(service: &str) -> anyhow::Result<()> {
        if service.contains(KEY_SEPARATOR) {
            return Err(anyhow::anyhow!(
                "service name must not contain a NUL character"
            ));
        }
        Ok(())
    }

    fn version_prefix(service: &str) -> String {
        format!("{}{}", service, KEY_SEPARATOR)
    }

    /// Zero-padded so lexicographic key order is numeric version order
    fn version_key(service: &str, version: u64) -> String {
        format!("{}{}{:020}", service, KEY_SEPARATOR, version)
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &str,
    ) -> anyhow::Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self
            .db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| anyhow::anyhow!("RocksDB get error: {}", e))?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: serde::Serialize>(&self, cf_name: &str, key: &str, value: &T) -> anyhow::Result<()> {
        let cf = self.cf(cf_name)?;
        self.db
            .put_cf(cf, key.as_bytes(), serde_json::to_vec(value)?)
            .map_err(|e| anyhow::anyhow!("RocksDB put error: {}", e))
    }

    fn delete_key(&self, cf_name: &str, key: &str) -> anyhow::Result<()> {
        let cf = self.cf(cf_name)?;
        self.db
            .delete_cf(cf, key.as_bytes())
            .map_err(|e| anyhow::anyhow!("RocksDB delete error: {}", e))
    }

    /// All version records of a service in ascending version order
    fn scan_versions(&self, service: &str) -> anyhow::Result<Vec<ConfigVersion>> {
        let cf = self.cf(CF_VERSIONS)?;
        let prefix = Self::version_prefix(service);
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        let mut records = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| anyhow::anyhow!("RocksDB iterator error: {}", e))?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn has_versions(&self, service: &str) -> anyhow::Result<bool> {
        let cf = self.cf(CF_VERSIONS)?;
        let prefix = Self::version_prefix(service);
        let mut iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        match iter.next() {
            Some(item) => {
                let (key, _) = item.map_err(|e| anyhow::anyhow!("RocksDB iterator error: {}", e))?;
                Ok(key.starts_with(prefix.as_bytes()))
            }
            None => Ok(false),
        }
    }

    fn scoped(&self, service: &str, scope: VersionScope) -> anyhow::Result<Vec<ConfigVersion>> {
        match scope {
            VersionScope::All => self.scan_versions(service),
            VersionScope::Exact(version) => Ok(self
                .get_json(CF_VERSIONS, &Self::version_key(service, version))?
                .into_iter()
                .collect()),
        }
    }
}

#[async_trait]
impl DocumentStore for RocksDbStore {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    async fn collection_exists(&self, service: &str) -> anyhow::Result<bool> {
        Self::check_service(service)?;
        let has_counter = self
            .get_json::<VersionCounter>(CF_COUNTERS, service)?
            .is_some();
        Ok(has_counter || self.has_versions(service)?)
    }

    async fn create_collection(&self, service: &str) -> anyhow::Result<()> {
        // A container only exists through its records; creating one is a
        // check that nothing is stored yet.
        if self.collection_exists(service).await? {
            return Err(anyhow::anyhow!("collection '{}' already exists", service));
        }
        Ok(())
    }

    async fn insert_counter(&self, counter: VersionCounter) -> anyhow::Result<()> {
        Self::check_service(&counter.service)?;
        let _guard = self.write_lock.lock();
        if self
            .get_json::<VersionCounter>(CF_COUNTERS, &counter.service)?
            .is_some()
        {
            return Err(anyhow::anyhow!(
                "duplicate counter record for '{}'",
                counter.service
            ));
        }
        self.put_json(CF_COUNTERS, &counter.service, &counter)
    }

    async fn fetch_increment_counter(&self, service: &str) -> anyhow::Result<Option<u64>> {
        Self::check_service(service)?;
        let _guard = self.write_lock.lock();
        let Some(mut counter) = self.get_json::<VersionCounter>(CF_COUNTERS, service)? else {
            return Ok(None);
        };
        let current = counter.count;
        counter.count += 1;
        self.put_json(CF_COUNTERS, service, &counter)?;
        Ok(Some(current))
    }

    async fn insert_version(&self, record: ConfigVersion) -> anyhow::Result<()> {
        Self::check_service(&record.service)?;
        let key = Self::version_key(&record.service, record.version);
        let _guard = self.write_lock.lock();
        if self.get_json::<ConfigVersion>(CF_VERSIONS, &key)?.is_some() {
            return Err(anyhow::anyhow!(
                "duplicate version {} for '{}'",
                record.version,
                record.service
            ));
        }
        self.put_json(CF_VERSIONS, &key, &record)
    }

    async fn find_and_touch(
        &self,
        service: &str,
        scope: VersionScope,
        now: DateTime<Utc>,
    ) -> anyhow::Result<Option<ConfigVersion>> {
        Self::check_service(service)?;
        let _guard = self.write_lock.lock();
        let Some(mut record) = self.scoped(service, scope)?.pop() else {
            return Ok(None);
        };
        record.last_read_at = Some(now);
        self.put_json(
            CF_VERSIONS,
            &Self::version_key(service, record.version),
            &record,
        )?;
        Ok(Some(record))
    }

    async fn find_most_recently_read(
        &self,
        service: &str,
        scope: VersionScope,
    ) -> anyhow::Result<Option<ConfigVersion>> {
        Self::check_service(service)?;
        let records = self.scoped(service, scope)?;
        Ok(most_recently_read(&records).cloned())
    }

    async fn version_numbers(&self, service: &str) -> anyhow::Result<Vec<u64>> {
        Self::check_service(service)?;
        Ok(self
            .scan_versions(service)?
            .into_iter()
            .map(|r| r.version)
            .collect())
    }

    async fn delete_version(&self, service: &str, version: u64) -> anyhow::Result<bool> {
        Self::check_service(service)?;
        let key = Self::version_key(service, version);
        let _guard = self.write_lock.lock();
        let existed = self.get_json::<ConfigVersion>(CF_VERSIONS, &key)?.is_some();
        if existed {
            self.delete_key(CF_VERSIONS, &key)?;
        }
        Ok(existed)
    }

    async fn drop_collection(&self, service: &str) -> anyhow::Result<()> {
        Self::check_service(service)?;
        let _guard = self.write_lock.lock();
        for record in self.scan_versions(service)? {
            self.delete_key(CF_VERSIONS, &Self::version_key(service, record.version))?;
        }
        self.delete_key(CF_COUNTERS, service)
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.db
            .flush()
            .map_err(|e| anyhow::anyhow!("RocksDB flush error: {}", e))?;
        for cf_name in [CF_COUNTERS, CF_VERSIONS] {
            let cf = self.cf(cf_name)?;
            self.db
                .flush_cf(cf)
                .map_err(|e| anyhow::anyhow!("RocksDB flush error: {}", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::StorageEngine;
    use crate::traits::ConfigStorage;
    use std::time::Duration;

    #[tokio::test]
    async fn test_versions_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        for v in [2, 10, 1] {
            store
                .insert_version(ConfigVersion::new("svc", v, "{}".to_string()))
                .await
                .unwrap();
        }
        assert_eq!(store.version_numbers("svc").await.unwrap(), vec![1, 2, 10]);

        let latest = store
            .find_and_touch("svc", VersionScope::All, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.version, 10);
    }

    #[tokio::test]
    async fn test_prefix_does_not_leak_between_services() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        store
            .insert_version(ConfigVersion::new("app", 1, "{}".to_string()))
            .await
            .unwrap();
        store
            .insert_version(ConfigVersion::new("app-extra", 4, "{}".to_string()))
            .await
            .unwrap();

        assert_eq!(store.version_numbers("app").await.unwrap(), vec![1]);
        store.drop_collection("app").await.unwrap();
        assert!(store.collection_exists("app-extra").await.unwrap());
    }

    #[tokio::test]
    async fn test_engine_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let engine = StorageEngine::new(
                RocksDbStore::open(dir.path()).unwrap(),
                Duration::from_secs(10),
            );
            engine.create("svc", br#"{"a":1}"#).await.unwrap();
            engine.update("svc", br#"{"a":2}"#).await.unwrap();
            engine.close().await.unwrap();
        }

        let engine = StorageEngine::new(
            RocksDbStore::open(dir.path()).unwrap(),
            Duration::from_secs(10),
        );
        assert_eq!(engine.update("svc", br#"{"a":3}"#).await.unwrap(), 3);
        assert_eq!(engine.read("svc", 0).await.unwrap().payload, r#"{"a":3}"#);
    }

    #[tokio::test]
    async fn test_rejects_nul_in_service() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksDbStore::open(dir.path()).unwrap();
        assert!(store.collection_exists("bad\0name").await.is_err());
    }
}
