// Gateway error type and its mapping onto HTTP status codes
// The mapping is total and depends only on the error kind

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use vconf_common::StorageError;

/// Everything a gateway request can fail with
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl GatewayError {
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::MalformedBody(_) => "malformed_body",
            GatewayError::Storage(e) => e.kind(),
        }
    }
}

impl ResponseError for GatewayError {
    fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::Storage(e) => match e {
                StorageError::InvalidServiceName | StorageError::InvalidPayload => {
                    StatusCode::BAD_REQUEST
                }
                StorageError::AlreadyExists(_) | StorageError::InUse { .. } => {
                    StatusCode::FORBIDDEN
                }
                StorageError::NotFound { .. } | StorageError::ServiceNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                StorageError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: StorageError) -> StatusCode {
        GatewayError::from(err).status_code()
    }

    #[test]
    fn test_storage_error_status_mapping() {
        assert_eq!(status(StorageError::InvalidServiceName), StatusCode::BAD_REQUEST);
        assert_eq!(status(StorageError::InvalidPayload), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(StorageError::AlreadyExists("s".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(StorageError::InUse {
                service: "s".to_string(),
                version: 1
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status(StorageError::NotFound {
                service: "s".to_string(),
                version: 0
            }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StorageError::ServiceNotFound("s".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(StorageError::Backend(anyhow::anyhow!("boom"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = GatewayError::from(err);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "malformed_body");
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }
}
