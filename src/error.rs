use std::any::Any;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{
    ERR_INTERNAL, ERR_INVALID_JSON, ERR_METHOD_NOT_ALLOWED, ERR_MISSING_FIELDS,
    ERR_PROFILE_CREATE, ERR_PROFILE_LOOKUP,
};
use crate::db::StoreError;
use crate::services::SyncError;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("Missing required fields")]
    MissingFields,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Profile lookup failed: {0}")]
    ProfileLookup(StoreError),

    #[error("Profile creation failed: {0}")]
    ProfileCreate(StoreError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::MissingFields => AppError::MissingFields,
            SyncError::LookupFailed(e) => AppError::ProfileLookup(e),
            SyncError::CreationFailed(e) => AppError::ProfileCreate(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidJson(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, detail) = match self {
            AppError::InvalidJson(detail) => {
                (StatusCode::BAD_REQUEST, ERR_INVALID_JSON.to_string(), Some(detail))
            }
            AppError::MissingFields => {
                (StatusCode::BAD_REQUEST, ERR_MISSING_FIELDS.to_string(), None)
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                ERR_METHOD_NOT_ALLOWED.to_string(),
                None,
            ),
            AppError::ProfileLookup(e) => {
                tracing::error!("Profile lookup error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ERR_PROFILE_LOOKUP.to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::ProfileCreate(e) => {
                tracing::error!("Profile creation error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ERR_PROFILE_CREATE.to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Record not found".to_string(), None)
            }
            AppError::Store(e) => {
                tracing::error!("Store error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Store request failed".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL.to_string(), None)
            }
        };

        let body = match detail {
            Some(detail) => json!({ "error": error_message, "detail": detail }),
            None => json!({ "error": error_message }),
        };

        (status, Json(body)).into_response()
    }
}

/// Turn a handler panic into a generic 500 response
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    AppError::Internal(detail).into_response()
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (AppError::MissingFields, StatusCode::BAD_REQUEST),
            (AppError::InvalidJson("eof".to_string()), StatusCode::BAD_REQUEST),
            (AppError::MethodNotAllowed, StatusCode::METHOD_NOT_ALLOWED),
            (AppError::Store(StoreError::NotFound), StatusCode::NOT_FOUND),
            (
                AppError::ProfileLookup(StoreError::Parse("bad".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::ProfileCreate(StoreError::Parse("bad".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AppError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_sync_error_conversion() {
        assert!(matches!(
            AppError::from(SyncError::MissingFields),
            AppError::MissingFields
        ));
        assert!(matches!(
            AppError::from(SyncError::LookupFailed(StoreError::NotFound)),
            AppError::ProfileLookup(_)
        ));
        assert!(matches!(
            AppError::from(SyncError::CreationFailed(StoreError::NotFound)),
            AppError::ProfileCreate(_)
        ));
    }

    #[test]
    fn test_panic_handler_returns_500() {
        let response = handle_panic(Box::new("handler exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
