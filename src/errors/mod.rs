use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::blob::BlobError;
use crate::store::StoreError;

/// Failures surfaced by the write path and the detail lookup.
///
/// Transient read failures never appear here: the read gateway retries and
/// then degrades to empty results instead of erroring.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("store failure during {step}: {source}")]
    Store {
        step: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("image upload failed: {0}")]
    BlobUpload(#[source] BlobError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn store(step: &'static str, source: StoreError) -> Self {
        ServiceError::Store { step, source }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServiceError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ServiceError::Store { step, source } => {
                tracing::error!(step, error = %source, "store operation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Storage failure during {step}"),
                )
            }
            ServiceError::BlobUpload(err) => {
                tracing::error!(error = %err, "image upload failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error processing event image".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = ServiceError::validation("Event name is required").into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let resp = ServiceError::not_found("Event not found with id: E1").into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_failure_maps_to_500() {
        let err = ServiceError::store("persist event", StoreError::Permanent("boom".into()));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
