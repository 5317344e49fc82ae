//! Client error types for the vconf SDK

use reqwest::StatusCode;

/// Error type for vconf client operations
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("empty service name")]
    EmptyServiceName,

    #[error("empty config data")]
    EmptyConfigData,

    #[error("callback is already assigned")]
    CallbackAlreadyAssigned,

    #[error("refresh period must be greater than zero")]
    InvalidRefreshPeriod,

    #[error("invalid endpoint uri: {0}")]
    InvalidUri(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request aborted with status: {status}")]
    Status { status: StatusCode, body: String },

    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(ClientError::EmptyServiceName.to_string(), "empty service name");
        assert_eq!(
            ClientError::CallbackAlreadyAssigned.to_string(),
            "callback is already assigned"
        );

        let err = ClientError::Status {
            status: StatusCode::FORBIDDEN,
            body: String::new(),
        };
        assert_eq!(err.to_string(), "request aborted with status: 403 Forbidden");
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<u32>("x").unwrap_err();
        assert!(matches!(ClientError::from(err), ClientError::Decode(_)));
    }
}
