// ABOUTME: Error type returned by bookshelf API handlers and its HTTP mapping.
// ABOUTME: Server-side failures are logged here; callers only ever see a generic message.

use axum::Json;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bookshelf_core::ValidationError;
use bookshelf_store::{ImageError, PersistenceError};
use http::header;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JSON body of every error response except 405.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid story: {0}")]
    Validation(#[from] ValidationError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("failed to fetch stories: {0}")]
    FetchStories(#[source] PersistenceError),

    #[error("failed to create story: {0}")]
    CreateStory(#[source] PersistenceError),

    #[error("failed to upload image: {0}")]
    UploadImage(#[source] std::io::Error),

    #[error("method {method} not allowed")]
    MethodNotAllowed {
        method: Method,
        allow: &'static str,
    },
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Io(e) => ApiError::UploadImage(e),
            ImageError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            ImageError::UnsupportedType(_) | ImageError::Empty => {
                ApiError::BadRequest(err.to_string())
            }
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(e) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
            ApiError::BadRequest(msg) => error_response(StatusCode::BAD_REQUEST, msg),
            ApiError::PayloadTooLarge(msg) => error_response(StatusCode::PAYLOAD_TOO_LARGE, msg),
            ApiError::FetchStories(e) => {
                tracing::error!(error = %e, "failed to fetch stories");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch stories")
            }
            ApiError::CreateStory(e) => {
                tracing::error!(error = %e, "failed to create story");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create story")
            }
            ApiError::UploadImage(e) => {
                tracing::error!(error = %e, "failed to store uploaded image");
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to upload image")
            }
            ApiError::MethodNotAllowed { method, allow } => (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, allow)],
                format!("Method {} Not Allowed", method),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn persistence_detail_is_not_leaked() {
        let resp = ApiError::CreateStory(PersistenceError::Corrupt("secret row 42".into()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({ "error": "Failed to create story" }));
    }

    #[tokio::test]
    async fn validation_maps_to_400_with_message() {
        let resp = ApiError::from(ValidationError::EmptyTitle).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "title must not be empty");
    }

    #[test]
    fn image_errors_map_by_kind() {
        assert!(matches!(
            ApiError::from(ImageError::Empty),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ImageError::TooLarge { size: 9, limit: 1 }),
            ApiError::PayloadTooLarge(_)
        ));
        assert!(matches!(
            ApiError::from(ImageError::Io(std::io::Error::other("disk full"))),
            ApiError::UploadImage(_)
        ));
    }

    #[tokio::test]
    async fn method_not_allowed_sets_allow_header() {
        let resp = ApiError::MethodNotAllowed {
            method: Method::PUT,
            allow: "GET, POST",
        }
        .into_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[header::ALLOW], "GET, POST");
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"Method PUT Not Allowed");
    }
}
