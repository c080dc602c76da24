//! Photo domain types

use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::{PhotoStorageError, PhotoStorageResult};

/// Prefix shared by every generated photo identifier
pub const PHOTO_NAME_PREFIX: &str = "photo-";

/// A photo currently held by a storage backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    /// Backend-assigned stable key (file name or remote public id)
    pub identifier: String,
    /// Public retrieval URL
    pub url: String,
    /// Creation time when the backend exposes it
    pub created_at: Option<DateTime<Utc>>,
}

impl Photo {
    /// Age of the photo at `now`, if the backend reported a creation time
    #[must_use]
    pub fn age_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.created_at.map(|created_at| now - created_at)
    }
}

/// Result of a successful store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPhoto {
    /// Identifier to use for later deletes
    pub identifier: String,
    /// URL resolving to the stored blob
    pub url: String,
}

/// Image payload handed to [`crate::PhotoStorage::store`]
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// MIME type reported by the client, if any
    pub content_type: Option<String>,
    /// File name reported by the client. Only its extension is ever used.
    pub original_name: Option<String>,
}

impl PhotoUpload {
    /// Creates an upload with a content type and no client file name
    #[must_use]
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: Some(content_type.into()),
            original_name: None,
        }
    }

    /// Resolves the image format from the content type, falling back to the
    /// client file name's extension when the type is missing or generic
    ///
    /// # Errors
    ///
    /// Returns `PhotoStorageError::UnsupportedContentType` if neither names a
    /// supported image format
    pub fn format(&self) -> PhotoStorageResult<ImageFormat> {
        let content_type = self.content_type.as_deref().map(str::trim);

        if let Some(format) = content_type.and_then(ImageFormat::from_content_type) {
            return Ok(format);
        }

        let generic = content_type.map_or(true, |ct| {
            ct.is_empty() || ct.starts_with(mime::APPLICATION_OCTET_STREAM.as_ref())
        });
        if generic {
            if let Some(format) = self
                .original_name
                .as_deref()
                .and_then(|name| Path::new(name).extension())
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
            {
                return Ok(format);
            }
        }

        Err(PhotoStorageError::UnsupportedContentType(
            content_type.unwrap_or("<none>").to_string(),
        ))
    }
}

/// Image formats accepted for upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ImageFormat {
    /// JPEG
    Jpeg,
    /// PNG
    Png,
    /// GIF
    Gif,
    /// WebP
    Webp,
}

impl ImageFormat {
    /// Canonical file extension
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    /// Canonical MIME type
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    /// Parses a file extension, case-insensitively
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Parses a MIME type such as `image/jpeg; charset=binary`
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let parsed: mime::Mime = content_type.parse().ok()?;
        if parsed.type_() != mime::IMAGE {
            return None;
        }
        match parsed.subtype().as_str() {
            "jpeg" | "jpg" | "pjpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Time-based base name for a new photo, e.g. `photo-1718000000000`
#[must_use]
pub fn timestamped_name(now: DateTime<Utc>) -> String {
    format!("{PHOTO_NAME_PREFIX}{}", now.timestamp_millis())
}
