//! Request parameter types for the config API

use serde::Deserialize;
use vconf_common::{LATEST_VERSION, StorageError, StorageResult};

/// Query parameters of read and delete requests
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigQueryParam {
    pub service: Option<String>,
    pub version: Option<String>,
}

impl ConfigQueryParam {
    /// Service name and version, where a missing or non-numeric version
    /// selects the latest one
    pub fn service_and_version(&self) -> StorageResult<(&str, u64)> {
        let service = match self.service.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return Err(StorageError::InvalidServiceName),
        };

        let version = self
            .version
            .as_deref()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(LATEST_VERSION);

        Ok((service, version))
    }
}
