use async_trait::async_trait;
use strum::Display;

use crate::error::PhotoStorageResult;
use crate::photo::{Photo, PhotoUpload, StoredPhoto};

/// Which persistence strategy backs a [`PhotoStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKind {
    /// Files in a local directory served as static assets
    LocalDisk,
    /// Remote asset host (Cloudinary)
    Cloudinary,
}

/// Storage backend for captured photos
///
/// Implementations never keep a separate index: [`PhotoStorage::list`] always
/// reflects what the backend holds at the time of the call.
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Persists an image and returns its identifier and public URL.
    ///
    /// A failed store must never become visible to [`PhotoStorage::list`].
    async fn store(&self, upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto>;

    /// Lists the photos currently stored
    ///
    /// Backends may cap the number of results; see [`PhotoStorage::list_all`].
    async fn list(&self) -> PhotoStorageResult<Vec<Photo>>;

    /// Enumerates every stored photo, regardless of any page cap on `list`.
    ///
    /// Retention relies on this to reach the oldest photos.
    async fn list_all(&self) -> PhotoStorageResult<Vec<Photo>> {
        self.list().await
    }

    /// Deletes a photo by identifier.
    ///
    /// Returns `PhotoStorageError::NotFound` if nothing is stored under it.
    async fn delete(&self, identifier: &str) -> PhotoStorageResult<()>;

    /// Backend name, used in logs
    fn kind(&self) -> StorageKind;
}
