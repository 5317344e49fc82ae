//! Storage engine
//!
//! Owns the per-service version history semantics on top of any
//! [`DocumentStore`]:
//! - create-once: a service's history is started exactly once
//! - monotonic versions allocated from the per-service counter
//! - delete safety: a version read within the grace window is not deleted;
//!   version 1 counts as read when the service is created
//!
//! Known consistency gaps; the backing store is only atomic per record:
//! - the existence check in `create` is not atomic with the writes that
//!   follow, so two concurrent creates of one service may both pass it
//! - `create` writes the counter and version 1 separately; a failure between
//!   them leaves a service that exists but cannot be read
//! - `update` increments the counter before inserting the version; a failed
//!   insert permanently skips that version number
//! - an `update` racing a whole-history `delete` can insert its version after
//!   the container was dropped, leaving a service with versions but no
//!   counter: further updates fail with `ServiceNotFound` and creates with
//!   `AlreadyExists` until the history is deleted again
//!
//! None of these are repaired or retried here.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use vconf_common::{
    ConfigVersion, FIRST_VERSION, StorageError, StorageResult, is_valid_payload, validate_service,
};

use crate::allocator::VersionAllocator;
use crate::traits::{ConfigStorage, DocumentStore, VersionScope};

pub struct StorageEngine<S: DocumentStore> {
    store: Arc<S>,
    allocator: VersionAllocator<S>,
    grace_window: chrono::Duration,
}

impl<S: DocumentStore> StorageEngine<S> {
    pub fn new(store: S, grace_window: Duration) -> Self {
        Self::from_shared(Arc::new(store), grace_window)
    }

    /// Build over a store the caller keeps a handle to
    pub fn from_shared(store: Arc<S>, grace_window: Duration) -> Self {
        let grace_window =
            chrono::Duration::from_std(grace_window).unwrap_or(chrono::Duration::MAX);
        Self {
            allocator: VersionAllocator::new(store.clone()),
            store,
            grace_window,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Version numbers currently stored for a service, ascending
    pub async fn versions(&self, service: &str) -> StorageResult<Vec<u64>> {
        validate_service(service)?;
        Ok(self.store.version_numbers(service).await?)
    }

    fn validated_payload(payload: &[u8]) -> StorageResult<String> {
        if !is_valid_payload(payload) {
            return Err(StorageError::InvalidPayload);
        }
        String::from_utf8(payload.to_vec()).map_err(|_| StorageError::InvalidPayload)
    }
}

#[async_trait]
impl<S: DocumentStore + 'static> ConfigStorage for StorageEngine<S> {
    async fn create(&self, service: &str, payload: &[u8]) -> StorageResult<()> {
        validate_service(service)?;
        let payload = Self::validated_payload(payload)?;

        if self.store.collection_exists(service).await? {
            return Err(StorageError::AlreadyExists(service.to_string()));
        }

        self.store.create_collection(service).await?;
        self.allocator.seed(service).await?;

        if let Err(e) = self
            .store
            .insert_version(ConfigVersion::new_read(service, FIRST_VERSION, payload))
            .await
        {
            warn!(
                service,
                error = %e,
                "counter written but version 1 was not, service is unreadable"
            );
            return Err(e.into());
        }

        debug!(service, "created config history");
        Ok(())
    }

    async fn read(&self, service: &str, version: u64) -> StorageResult<ConfigVersion> {
        validate_service(service)?;

        self.store
            .find_and_touch(service, VersionScope::from_version(version), Utc::now())
            .await?
            .ok_or_else(|| StorageError::NotFound {
                service: service.to_string(),
                version,
            })
    }

    async fn update(&self, service: &str, payload: &[u8]) -> StorageResult<u64> {
        validate_service(service)?;
        let payload = Self::validated_payload(payload)?;

        let version = self.allocator.allocate(service).await?;

        if let Err(e) = self
            .store
            .insert_version(ConfigVersion::new(service, version, payload))
            .await
        {
            warn!(service, version, error = %e, "version number skipped");
            return Err(e.into());
        }

        debug!(service, version, "stored new config version");
        Ok(version)
    }

    async fn delete(&self, service: &str, version: u64) -> StorageResult<()> {
        validate_service(service)?;
        let scope = VersionScope::from_version(version);

        let Some(latest_read) = self.store.find_most_recently_read(service, scope).await? else {
            // Nothing in scope. A whole-history delete still drops a container
            // left without versions by a half-finished create.
            if scope == VersionScope::All && self.store.collection_exists(service).await? {
                self.store.drop_collection(service).await?;
            }
            return Ok(());
        };

        if latest_read.read_within(self.grace_window, Utc::now()) {
            return Err(StorageError::InUse {
                service: service.to_string(),
                version: latest_read.version,
            });
        }

        match scope {
            VersionScope::All => self.store.drop_collection(service).await?,
            VersionScope::Exact(v) => {
                self.store.delete_version(service, v).await?;
            }
        }

        debug!(service, version, "deleted config");
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(self.store.close().await?)
    }

    fn backend_name(&self) -> &'static str {
        self.store.name()
    }
}
