//! Error handling for the bookshelf HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bookshelf_db::StoreError;
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationErrors;

/// Application error types that map to HTTP responses
///
/// Every variant renders as the error envelope
/// `{"status": false, "message": ...}` where `message` is either a string
/// or, for validation failures, the field-keyed error map.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Build the error envelope body.
pub fn error_envelope(message: impl Into<Value>) -> Value {
    json!({
        "status": false,
        "message": message.into(),
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::now_v7();
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "request failed"
            );
        } else {
            tracing::warn!(
                error_id = %error_id,
                status_code = %status.as_u16(),
                error = %self,
                "request rejected"
            );
        }

        let message = match self {
            AppError::Validation(errors) => {
                serde_json::to_value(errors).unwrap_or_else(|e| Value::String(e.to_string()))
            }
            AppError::NotFound { message } | AppError::BadRequest { message } => {
                Value::String(message)
            }
            // In production, we hide internal error details
            _ if cfg!(not(debug_assertions)) => {
                Value::String("An internal server error occurred".to_string())
            }
            other => Value::String(other.to_string()),
        };

        (status, Json(error_envelope(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_mapping() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "This field may not be blank.");
        let response = AppError::from(errors).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({"status": false, "message": {"name": ["This field may not be blank."]}})
        );
    }

    #[tokio::test]
    async fn test_not_found_mapping() {
        let response = AppError::not_found("Book does not exist!").into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            body_json(response).await,
            json!({"status": false, "message": "Book does not exist!"})
        );
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let response = AppError::Internal(internal_error).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::from(StoreError::Poisoned).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
