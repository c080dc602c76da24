//! Error types for photo storage operations

use thiserror::Error;

/// Result type for photo storage operations
pub type PhotoStorageResult<T> = Result<T, PhotoStorageError>;

/// Errors that can occur during photo storage operations
#[derive(Error, Debug)]
pub enum PhotoStorageError {
    /// Identifier is malformed or escapes the storage namespace
    #[error("Invalid photo identifier: {0}")]
    InvalidIdentifier(String),

    /// No photo is stored under the identifier
    #[error("Photo not found: {0}")]
    NotFound(String),

    /// Upload is not an image format we accept
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// Persisting the blob failed
    #[error("Failed to store photo: {0}")]
    StorageWrite(String),

    /// Listing or inspecting stored photos failed
    #[error("Failed to read photos: {0}")]
    StorageRead(String),

    /// Remote asset host unreachable or rejected our credentials
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),
}

impl PhotoStorageError {
    /// Whether the error means the photo is already absent
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for PhotoStorageError {
    fn from(error: reqwest::Error) -> Self {
        Self::BackendUnavailable(error.to_string())
    }
}
