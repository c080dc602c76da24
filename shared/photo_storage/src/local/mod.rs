//! Local disk photo storage
//!
//! Photos live as plain files in a single uploads directory that the HTTP
//! server exposes under a static prefix. The file name is the identifier.

mod file_name;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use file_name::is_orphaned_image;
pub use file_name::validate_file_name;

use crate::error::{PhotoStorageError, PhotoStorageResult};
use crate::photo::{timestamped_name, Photo, PhotoUpload, StoredPhoto};
use crate::provider::{PhotoStorage, StorageKind};

/// Upper bound on `-<n>` suffixes tried when names collide within a millisecond
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Local file system photo storage
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    uploads_dir: PathBuf,
    public_url_prefix: String,
}

impl LocalDiskStorage {
    /// Creates a new local disk storage
    ///
    /// # Arguments
    ///
    /// * `uploads_dir` - Directory holding the photo files
    /// * `public_url_prefix` - Absolute URL the directory is served under, e.g. `http://localhost:3001/uploads`
    #[must_use]
    pub fn new(uploads_dir: impl Into<PathBuf>, public_url_prefix: impl AsRef<str>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
            public_url_prefix: public_url_prefix.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding the photo files
    #[must_use]
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Creates the uploads directory if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns `PhotoStorageError::StorageWrite` if the directory cannot be created
    pub async fn ensure_uploads_dir(&self) -> PhotoStorageResult<()> {
        fs::create_dir_all(&self.uploads_dir).await.map_err(|e| {
            PhotoStorageError::StorageWrite(format!(
                "Failed to create uploads directory {}: {e}",
                self.uploads_dir.display()
            ))
        })
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.public_url_prefix)
    }

    async fn write_temp_file(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }

    /// Links the fully written temp file under the first free name.
    ///
    /// `hard_link` refuses to replace an existing file, so two uploads within
    /// the same millisecond can never clobber each other.
    async fn publish(
        &self,
        temp_path: &Path,
        base_name: &str,
        extension: &str,
    ) -> PhotoStorageResult<String> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let file_name = if attempt == 0 {
                format!("{base_name}.{extension}")
            } else {
                format!("{base_name}-{attempt}.{extension}")
            };

            match fs::hard_link(temp_path, self.uploads_dir.join(&file_name)).await {
                Ok(()) => return Ok(file_name),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(PhotoStorageError::StorageWrite(format!(
                        "Failed to publish {file_name}: {e}"
                    )))
                }
            }
        }

        Err(PhotoStorageError::StorageWrite(format!(
            "No free file name for {base_name} after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }
}

#[async_trait]
impl PhotoStorage for LocalDiskStorage {
    async fn store(&self, upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto> {
        let format = upload.format()?;

        // Hidden and without an image extension, so never listed
        let temp_path = self
            .uploads_dir
            .join(format!(".{}.part", Uuid::new_v4().simple()));

        if let Err(e) = self.write_temp_file(&temp_path, &upload.bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(PhotoStorageError::StorageWrite(format!(
                "Failed to write {}: {e}",
                temp_path.display()
            )));
        }

        let published = self
            .publish(&temp_path, &timestamped_name(Utc::now()), format.extension())
            .await;

        if let Err(e) = fs::remove_file(&temp_path).await {
            warn!("Failed to remove temp file {}: {e}", temp_path.display());
        }

        let file_name = published?;
        debug!("Stored photo {file_name} ({} bytes)", upload.bytes.len());

        Ok(StoredPhoto {
            url: self.url_for(&file_name),
            identifier: file_name,
        })
    }

    async fn list(&self) -> PhotoStorageResult<Vec<Photo>> {
        let mut entries = fs::read_dir(&self.uploads_dir).await.map_err(|e| {
            PhotoStorageError::StorageRead(format!(
                "Failed to read {}: {e}",
                self.uploads_dir.display()
            ))
        })?;

        let mut photos = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| PhotoStorageError::StorageRead(e.to_string()))?
        {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_file_name(&file_name).is_err() {
                if is_orphaned_image(&file_name) {
                    debug!("Skipping {file_name}: not a valid photo name, retention ignores it");
                }
                continue;
            }

            // The entry may vanish between read_dir and stat
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Skipping {file_name}: failed to read metadata: {e}");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            photos.push(Photo {
                url: self.url_for(&file_name),
                created_at: metadata.modified().ok().map(DateTime::<Utc>::from),
                identifier: file_name,
            });
        }

        photos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.identifier.cmp(&b.identifier))
        });

        Ok(photos)
    }

    async fn delete(&self, identifier: &str) -> PhotoStorageResult<()> {
        validate_file_name(identifier)?;
        let path = self.uploads_dir.join(identifier);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted photo {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(PhotoStorageError::NotFound(identifier.to_string()))
            }
            Err(e) => Err(PhotoStorageError::StorageWrite(format!(
                "Failed to delete {}: {e}",
                path.display()
            ))),
        }
    }

    fn kind(&self) -> StorageKind {
        StorageKind::LocalDisk
    }
}
