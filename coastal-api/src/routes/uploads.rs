/// Image upload endpoint
///
/// `POST /uploads/image` takes a multipart body with a `file` field and
/// answers `{"url": "/media/<name>"}`. No authentication; the size is capped
/// by `MAX_UPLOAD_BYTES`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    Json,
};
use bytes::{Bytes, BytesMut};
use coastal_shared::error::ServiceError;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Multipart field carrying the file
pub const FILE_FIELD: &str = "file";

/// Upload response
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Where the stored file is served
    pub url: String,
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge("Upload exceeds the size limit".to_string())
        } else {
            ApiError::BadRequest(err.body_text())
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Reads a field chunk by chunk, stopping as soon as it passes `limit`
async fn read_limited(mut field: Field<'_>, limit: usize) -> ApiResult<Bytes> {
    let mut data = BytesMut::new();
    while let Some(chunk) = field.chunk().await? {
        if data.len() + chunk.len() > limit {
            return Err(ApiError::PayloadTooLarge(format!(
                "Upload exceeds {} bytes",
                limit
            )));
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data.freeze())
}

/// Stores an uploaded image and returns its URL
///
/// # Errors
///
/// - `400 Bad Request`: Not multipart, no `file` field or an empty file
/// - `413 Payload Too Large`: File over the configured limit
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let limit = state.config.api.max_upload_bytes;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = read_limited(field, limit).await?;
        let size = data.len();

        let url = state
            .media
            .store(&filename, data)
            .await
            .map_err(ServiceError::from)?;

        info!(url = %url, size, "Stored upload");
        return Ok(Json(UploadResponse { url }));
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}
