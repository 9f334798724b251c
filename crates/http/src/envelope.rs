//! Success envelope: `{"status": true, "message": ..., "data": ...}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct SuccessBody<'a, T> {
    status: bool,
    message: &'a str,
    data: T,
}

/// A successful response carrying `data` in the success envelope.
#[derive(Debug)]
pub struct Success<T> {
    status: StatusCode,
    message: String,
    data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            status,
            message: message.into(),
            data,
        }
    }

    /// `200 OK`
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, data)
    }

    /// `201 Created`
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, data)
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let body = SuccessBody {
            status: true,
            message: &self.message,
            data: self.data,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn created_envelope() {
        let response = Success::created("Author created!", json!({"id": 1})).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({"status": true, "message": "Author created!", "data": {"id": 1}})
        );
    }
}
