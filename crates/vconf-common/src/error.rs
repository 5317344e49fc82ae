//! Error types for vconf storage operations
//!
//! `StorageError` is the precise, typed error every storage engine call
//! returns. The gateway maps each variant onto exactly one transport status.

/// Storage engine error taxonomy
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("empty service name")]
    InvalidServiceName,

    #[error("not valid json data")]
    InvalidPayload,

    #[error("config '{0}' already created")]
    AlreadyExists(String),

    #[error("config '{service}' version {version} not found")]
    NotFound { service: String, version: u64 },

    #[error("service '{0}' not found")]
    ServiceNotFound(String),

    #[error("config '{service}' version {version} is used")]
    InUse { service: String, version: u64 },

    #[error("backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StorageError {
    /// Short stable name of the error kind, used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            StorageError::InvalidServiceName => "invalid_service_name",
            StorageError::InvalidPayload => "invalid_payload",
            StorageError::AlreadyExists(_) => "already_exists",
            StorageError::NotFound { .. } => "not_found",
            StorageError::ServiceNotFound(_) => "service_not_found",
            StorageError::InUse { .. } => "in_use",
            StorageError::Backend(_) => "backend",
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
