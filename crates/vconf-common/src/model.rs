//! Versioned config data model
//!
//! One immutable `ConfigVersion` exists per (service, version) pair, plus one
//! `VersionCounter` per service holding the next version number to assign.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// A single immutable payload snapshot of a service's config
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigVersion {
    pub service: String,
    pub version: u64,
    /// Well-formed JSON text, validated before it was written
    pub payload: String,
    pub created_at: DateTime<Utc>,
    /// Stamped by every read of this version. The first version of a service
    /// starts stamped with its creation time; later versions start as `None`.
    #[serde(default)]
    pub last_read_at: Option<DateTime<Utc>>,
}

impl ConfigVersion {
    pub fn new(service: &str, version: u64, payload: String) -> Self {
        Self {
            service: service.to_string(),
            version,
            payload,
            created_at: Utc::now(),
            last_read_at: None,
        }
    }

    /// The first version of a new service, counted as read at creation
    pub fn new_read(service: &str, version: u64, payload: String) -> Self {
        let now = Utc::now();
        Self {
            service: service.to_string(),
            version,
            payload,
            created_at: now,
            last_read_at: Some(now),
        }
    }

    /// Whether this version was read less than `window` ago
    pub fn read_within(&self, window: chrono::Duration, now: DateTime<Utc>) -> bool {
        match self.last_read_at {
            Some(read_at) => now.signed_duration_since(read_at) < window,
            None => false,
        }
    }
}

/// Per-service allocator state: the next version number to hand out
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionCounter {
    pub service: String,
    pub count: u64,
}

/// Request body envelope for create and update calls
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestData {
    pub service: String,
    pub data: Box<RawValue>,
}

impl RequestData {
    /// Raw bytes of the `data` field exactly as sent
    pub fn payload(&self) -> &[u8] {
        self.data.get().as_bytes()
    }
}
