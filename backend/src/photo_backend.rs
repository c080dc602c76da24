//! Construction of the configured photo storage backend

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use photo_storage::{CloudinaryStorage, LocalDiskStorage, PhotoStorage};
use tracing::info;

use crate::types::{Environment, StorageMode};

/// Path the local uploads directory is served under
pub const UPLOADS_ROUTE: &str = "/uploads";

/// The active storage backend and, for local disk, the directory to serve
#[derive(Clone)]
pub struct PhotoBackend {
    /// Storage shared by the handlers and the retention sweeper
    pub storage: Arc<dyn PhotoStorage>,
    /// Directory served under [`UPLOADS_ROUTE`], local disk only
    pub static_dir: Option<PathBuf>,
}

impl PhotoBackend {
    /// Serves photos from a local directory
    ///
    /// # Errors
    ///
    /// Returns an error if the uploads directory cannot be created
    pub async fn local(uploads_dir: PathBuf, base_url: &str) -> anyhow::Result<Self> {
        let storage = LocalDiskStorage::new(&uploads_dir, format!("{base_url}{UPLOADS_ROUTE}"));
        storage
            .ensure_uploads_dir()
            .await
            .context("Failed to prepare uploads directory")?;

        Ok(Self {
            storage: Arc::new(storage),
            static_dir: Some(uploads_dir),
        })
    }

    /// Builds the backend selected by `STORAGE_MODE`
    ///
    /// # Errors
    ///
    /// Returns an error on invalid configuration or missing credentials
    pub async fn from_environment(environment: &Environment) -> anyhow::Result<Self> {
        let mode = environment.storage_mode()?;
        info!("Using {mode} photo storage");

        match mode {
            StorageMode::Local => {
                let uploads_dir = environment.uploads_dir();
                let base_url = environment.base_url()?;
                Self::local(uploads_dir, &base_url).await
            }
            StorageMode::Cloudinary => {
                let config = environment
                    .cloudinary_config()
                    .context("Cloudinary storage requires credentials")?;
                let storage = CloudinaryStorage::new(config)?;

                Ok(Self {
                    storage: Arc::new(storage),
                    static_dir: None,
                })
            }
        }
    }
}
