//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use photo_storage::PhotoStorageError;
use schemars::JsonSchema;
use serde::Serialize;

/// API error response envelope returned by every failing endpoint
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// Upload request without a usable `file` field
    #[must_use]
    pub const fn missing_file() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "no_file",
            "No file received",
            false,
        )
    }

    /// HTTP status of the error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

/// Convert photo storage errors to application errors
impl From<PhotoStorageError> for AppError {
    #[allow(clippy::cognitive_complexity)]
    fn from(err: PhotoStorageError) -> Self {
        use PhotoStorageError::{
            BackendUnavailable, InvalidIdentifier, NotFound, StorageRead, StorageWrite,
            UnsupportedContentType,
        };

        match &err {
            InvalidIdentifier(msg) => {
                tracing::warn!("Invalid identifier: {msg}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_identifier",
                    "Invalid file name",
                    false,
                )
            }
            UnsupportedContentType(content_type) => {
                tracing::warn!("Unsupported content type: {content_type}");
                Self::new(
                    StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    "unsupported_media_type",
                    "Only JPEG, PNG, GIF and WebP images are accepted",
                    false,
                )
            }
            NotFound(id) => {
                tracing::debug!("Photo not found: {id}");
                Self::new(
                    StatusCode::NOT_FOUND,
                    "not_found",
                    "File not found or already deleted",
                    false,
                )
            }
            StorageWrite(msg) => {
                tracing::error!("Storage write error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_write_error",
                    "Error writing to photo storage",
                    true,
                )
            }
            StorageRead(msg) => {
                tracing::error!("Storage read error: {msg}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_read_error",
                    "Error reading photos",
                    true,
                )
            }
            BackendUnavailable(msg) => {
                tracing::error!("Storage backend unavailable: {msg}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "backend_unavailable",
                    "Photo storage temporarily unavailable",
                    true,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
