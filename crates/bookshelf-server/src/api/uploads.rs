// ABOUTME: Cover image upload endpoint. POST /api/uploads takes a multipart `file` field.
// ABOUTME: Stores the image and returns the public URL that story creation passes through as imageUrl.

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::app_state::SharedState;
use crate::error::ApiError;

/// Response body after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// POST /api/uploads - Store the first `file` field and return its URL.
pub async fn upload_image(
    State(state): State<SharedState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut multipart = multipart.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(from_multipart)? {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(from_multipart)?;

        let stored = state.images.put(bytes.to_vec(), &content_type).await?;
        let url = state.image_url(&stored.key);

        tracing::info!(url = %url, "cover image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }

    Err(ApiError::BadRequest("missing multipart field `file`".to_string()))
}

/// Any other method on /api/uploads.
pub async fn reject_method(method: Method) -> ApiError {
    ApiError::MethodNotAllowed {
        method,
        allow: "POST",
    }
}

fn from_multipart(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(err.body_text())
    } else {
        ApiError::BadRequest(err.body_text())
    }
}
