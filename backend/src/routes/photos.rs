use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, Path},
    http::StatusCode,
    Extension, Json,
};
use photo_storage::{Photo, PhotoStorage, PhotoUpload, StorageKind, StoredPhoto};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::types::AppError;

/// Multipart field carrying the image
const FILE_FIELD: &str = "file";

/// A stored photo as seen by the booth UI
#[derive(Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoResponse {
    /// Public URL of the image
    pub url: String,
    /// Identifier to pass to the delete endpoint
    pub file_name: String,
    /// Remote asset id, only for the Cloudinary backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloudinary_id: Option<String>,
    /// RFC 3339 creation time, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl PhotoResponse {
    fn cloudinary_id(kind: StorageKind, identifier: &str) -> Option<String> {
        (kind == StorageKind::Cloudinary).then(|| identifier.to_string())
    }

    fn from_stored(kind: StorageKind, stored: StoredPhoto) -> Self {
        Self {
            cloudinary_id: Self::cloudinary_id(kind, &stored.identifier),
            url: stored.url,
            file_name: stored.identifier,
            created_at: None,
        }
    }

    fn from_photo(kind: StorageKind, photo: Photo) -> Self {
        Self {
            cloudinary_id: Self::cloudinary_id(kind, &photo.identifier),
            url: photo.url,
            file_name: photo.identifier,
            created_at: photo.created_at.map(|created_at| created_at.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteResponse {
    /// Confirmation message
    pub message: String,
}

fn multipart_error(err: &MultipartError) -> AppError {
    tracing::warn!("Failed to read multipart body: {err}");
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            "payload_too_large",
            "Uploaded file is too large",
            false,
        )
    } else {
        AppError::new(
            StatusCode::BAD_REQUEST,
            "invalid_multipart",
            "Malformed multipart body",
            false,
        )
    }
}

/// Reads the `file` field, `None` if it is missing or empty
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<PhotoUpload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(ToString::to_string);
        let original_name = field.file_name().map(ToString::to_string);
        let bytes = field.bytes().await.map_err(|e| multipart_error(&e))?;

        if bytes.is_empty() {
            return Ok(None);
        }

        return Ok(Some(PhotoUpload {
            bytes: bytes.to_vec(),
            content_type,
            original_name,
        }));
    }

    Ok(None)
}

/// Stores a captured photo
///
/// Expects a multipart body with the image in the `file` field. The stored
/// name is generated by the server; the client's file name is ignored.
///
/// # Errors
///
/// - 400 if no non-empty `file` field is present
/// - 415 if the file is not a supported image type
/// - 500/503 if the storage backend fails
#[instrument(skip(storage, multipart))]
pub async fn upload_photo(
    Extension(storage): Extension<Arc<dyn PhotoStorage>>,
    mut multipart: Multipart,
) -> Result<Json<PhotoResponse>, AppError> {
    let upload = read_file_field(&mut multipart)
        .await?
        .ok_or_else(AppError::missing_file)?;

    let stored = storage.store(upload).await?;
    info!("Stored photo: {}", stored.identifier);

    Ok(Json(PhotoResponse::from_stored(storage.kind(), stored)))
}

/// Lists all stored photos, newest first
///
/// An empty array means no photos; backend failures are reported as errors.
///
/// # Errors
///
/// Returns 500/503 if the storage backend cannot be read
#[instrument(skip(storage))]
pub async fn list_photos(
    Extension(storage): Extension<Arc<dyn PhotoStorage>>,
) -> Result<Json<Vec<PhotoResponse>>, AppError> {
    let kind = storage.kind();
    let photos = storage.list().await?;

    Ok(Json(
        photos
            .into_iter()
            .map(|photo| PhotoResponse::from_photo(kind, photo))
            .collect(),
    ))
}

/// Deletes a photo
///
/// `file_name` is percent-decoded by the path extractor, so remote ids
/// containing `/` must be sent encoded as `%2F`.
///
/// # Errors
///
/// - 400 for an invalid identifier
/// - 404 if the photo does not exist
/// - 500/503 if the storage backend fails
#[instrument(skip(storage))]
pub async fn delete_photo(
    Extension(storage): Extension<Arc<dyn PhotoStorage>>,
    Path(file_name): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    info!("Attempting to delete photo: {file_name}");
    storage.delete(&file_name).await?;

    Ok(Json(DeleteResponse {
        message: "File deleted successfully".to_string(),
    }))
}
