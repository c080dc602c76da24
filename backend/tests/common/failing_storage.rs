use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Notify;
use photo_storage::{
    Photo, PhotoStorage, PhotoStorageError, PhotoStorageResult, PhotoUpload, StorageKind,
    StoredPhoto,
};

/// Storage whose every call fails with a fixed error kind
pub struct UnavailableStorage {
    pub read_error: fn(String) -> PhotoStorageError,
}

#[async_trait]
impl PhotoStorage for UnavailableStorage {
    async fn store(&self, _upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto> {
        Err(PhotoStorageError::BackendUnavailable("host down".to_string()))
    }

    async fn list(&self) -> PhotoStorageResult<Vec<Photo>> {
        Err((self.read_error)("listing failed".to_string()))
    }

    async fn delete(&self, _identifier: &str) -> PhotoStorageResult<()> {
        Err(PhotoStorageError::BackendUnavailable("host down".to_string()))
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Cloudinary
    }
}

/// In-memory storage with scripted delete failures
pub struct ScriptedStorage {
    pub photos: Mutex<Vec<Photo>>,
    /// Identifiers whose delete fails with a write error
    pub failing: HashSet<String>,
    /// Identifiers that vanish right before their delete
    pub racing: HashSet<String>,
}

impl ScriptedStorage {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self {
            photos: Mutex::new(photos),
            failing: HashSet::new(),
            racing: HashSet::new(),
        }
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.photos
            .lock()
            .unwrap()
            .iter()
            .map(|photo| photo.identifier.clone())
            .collect()
    }
}

#[async_trait]
impl PhotoStorage for ScriptedStorage {
    async fn store(&self, _upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto> {
        Err(PhotoStorageError::StorageWrite("read only".to_string()))
    }

    async fn list(&self) -> PhotoStorageResult<Vec<Photo>> {
        Ok(self.photos.lock().unwrap().clone())
    }

    async fn delete(&self, identifier: &str) -> PhotoStorageResult<()> {
        if self.failing.contains(identifier) {
            return Err(PhotoStorageError::StorageWrite(format!(
                "permission denied: {identifier}"
            )));
        }

        let mut photos = self.photos.lock().unwrap();
        let before = photos.len();
        photos.retain(|photo| photo.identifier != identifier);

        if self.racing.contains(identifier) || photos.len() == before {
            return Err(PhotoStorageError::NotFound(identifier.to_string()));
        }
        Ok(())
    }

    fn kind(&self) -> StorageKind {
        StorageKind::LocalDisk
    }
}

/// Storage whose deletes never complete
pub struct StallingStorage {
    pub photos: Vec<Photo>,
    /// Notified when the first delete starts
    pub delete_started: Notify,
}

impl StallingStorage {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self {
            photos,
            delete_started: Notify::new(),
        }
    }
}

#[async_trait]
impl PhotoStorage for StallingStorage {
    async fn store(&self, _upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto> {
        Err(PhotoStorageError::StorageWrite("read only".to_string()))
    }

    async fn list(&self) -> PhotoStorageResult<Vec<Photo>> {
        Ok(self.photos.clone())
    }

    async fn delete(&self, _identifier: &str) -> PhotoStorageResult<()> {
        self.delete_started.notify_one();
        std::future::pending().await
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Cloudinary
    }
}
