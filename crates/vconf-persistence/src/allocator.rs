//! Per-service version allocator
//!
//! One monotonic counter record per service, mutated only through the store's
//! atomic fetch-and-increment. A value handed out is never handed out again,
//! but nothing guarantees the caller actually writes a version with it.

use std::sync::Arc;

use vconf_common::{COUNTER_SEED, StorageError, StorageResult, VersionCounter};

use crate::traits::DocumentStore;

pub struct VersionAllocator<S: DocumentStore> {
    store: Arc<S>,
}

impl<S: DocumentStore> VersionAllocator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Write the counter record of a newly created service.
    ///
    /// Version 1 is written directly by the create call, so the counter
    /// starts at the next number to hand out.
    pub async fn seed(&self, service: &str) -> StorageResult<()> {
        self.store
            .insert_counter(VersionCounter {
                service: service.to_string(),
                count: COUNTER_SEED,
            })
            .await?;
        Ok(())
    }

    /// Claim the next version number of a service
    pub async fn allocate(&self, service: &str) -> StorageResult<u64> {
        self.store
            .fetch_increment_counter(service)
            .await?
            .ok_or_else(|| StorageError::ServiceNotFound(service.to_string()))
    }
}
