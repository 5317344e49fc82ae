//! Validation helpers shared by the storage engine and the gateway

use crate::error::{StorageError, StorageResult};

/// Check that a payload is well-formed JSON
///
/// Only syntax is checked, never schema.
///
/// # Examples
///
/// ```
/// use vconf_common::is_valid_payload;
///
/// assert!(is_valid_payload(br#"{"key1":"value1"}"#));
/// assert!(is_valid_payload(b"[1, 2, 3]"));
/// assert!(!is_valid_payload(b"{key1: value1}"));
/// assert!(!is_valid_payload(b""));
/// ```
pub fn is_valid_payload(payload: &[u8]) -> bool {
    serde_json::from_slice::<serde::de::IgnoredAny>(payload).is_ok()
}

/// Reject empty service names
pub fn validate_service(service: &str) -> StorageResult<()> {
    if service.is_empty() {
        return Err(StorageError::InvalidServiceName);
    }
    Ok(())
}
