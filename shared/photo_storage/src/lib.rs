//! Photo storage backends for the photo booth
//!
//! This crate owns the photo lifecycle: storing captured images, listing what is
//! currently stored and deleting photos. Two interchangeable backends implement
//! [`PhotoStorage`]: a local directory served as static files, and a Cloudinary
//! style remote asset host.

pub mod cloudinary;
pub mod error;
pub mod local;
pub mod photo;
pub mod provider;

pub use cloudinary::{CloudinaryConfig, CloudinaryStorage};
pub use error::{PhotoStorageError, PhotoStorageResult};
pub use local::LocalDiskStorage;
pub use photo::{Photo, PhotoUpload, StoredPhoto};
pub use provider::{PhotoStorage, StorageKind};
