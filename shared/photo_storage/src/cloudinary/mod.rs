//! Cloudinary-backed photo storage
//!
//! Photos are uploaded into a single folder on the asset host. The host
//! normalizes every upload to JPEG and serves it from its CDN; the public id
//! (`<folder>/photo-<millis>`) is the identifier.

mod signer;
mod types;

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

pub use signer::{sign_params, SIGNATURE_ALGORITHM};
use types::{
    DestroyResponse, ErrorResponse, SearchRequest, SearchResource, SearchResponse, SortBy,
    UploadResponse,
};

use crate::error::{PhotoStorageError, PhotoStorageResult};
use crate::photo::{timestamped_name, Photo, PhotoUpload, StoredPhoto};
use crate::provider::{PhotoStorage, StorageKind};

/// Folder all photo booth uploads go into
pub const DEFAULT_FOLDER: &str = "photo-booth";

/// Default REST endpoint of the asset host
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com";

/// Page size of the search query behind `list`
pub const MAX_LIST_RESULTS: u32 = 100;

/// Largest page the search API hands out, used by `list_all`
pub const MAX_SEARCH_PAGE_SIZE: u32 = 500;

/// Upper bound on pages followed by `list_all`
const MAX_SEARCH_PAGES: usize = 1000;

/// Format every upload is converted to
const OUTPUT_FORMAT: &str = "jpg";

/// Delivery transformation inserted into returned URLs
const DELIVERY_TRANSFORMATION: &str = "q_auto,f_auto";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Credentials and endpoint of the asset host
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Account cloud name
    pub cloud_name: String,
    /// API key
    pub api_key: String,
    /// API secret used for signing
    pub api_secret: String,
    /// REST endpoint, [`DEFAULT_API_BASE`] outside of tests
    pub api_base: String,
    /// Folder uploads are placed in
    pub folder: String,
}

impl CloudinaryConfig {
    /// Creates a config for the public API and the default folder
    #[must_use]
    pub fn new(cloud_name: String, api_key: String, api_secret: String) -> Self {
        Self {
            cloud_name,
            api_key,
            api_secret,
            api_base: DEFAULT_API_BASE.to_string(),
            folder: DEFAULT_FOLDER.to_string(),
        }
    }
}

impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("folder", &self.folder)
            .finish()
    }
}

/// Photo storage on a Cloudinary-compatible asset host
#[derive(Debug, Clone)]
pub struct CloudinaryStorage {
    client: Client,
    config: CloudinaryConfig,
    api_root: String,
}

impl CloudinaryStorage {
    /// Creates a new client for the asset host
    ///
    /// # Errors
    ///
    /// Returns `PhotoStorageError::BackendUnavailable` if the API base is not a
    /// valid URL or the HTTP client cannot be built
    pub fn new(config: CloudinaryConfig) -> PhotoStorageResult<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            PhotoStorageError::BackendUnavailable(format!(
                "Invalid API base {}: {e}",
                config.api_base
            ))
        })?;

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let api_root = format!(
            "{}/v1_1/{}",
            api_base.as_str().trim_end_matches('/'),
            config.cloud_name
        );

        Ok(Self {
            client,
            config,
            api_root,
        })
    }

    /// Checks that a public id lies inside our folder and is well formed
    ///
    /// # Errors
    ///
    /// Returns `PhotoStorageError::InvalidIdentifier` otherwise
    pub fn validate_public_id(&self, public_id: &str) -> PhotoStorageResult<()> {
        let invalid = |reason: &str| {
            Err(PhotoStorageError::InvalidIdentifier(format!(
                "{public_id:?}: {reason}"
            )))
        };

        let Some(name) = public_id
            .strip_prefix(self.config.folder.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return invalid("outside of the photo folder");
        };

        if name
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return invalid("empty or relative path segment");
        }

        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/');
        if !name.chars().all(allowed) {
            return invalid("unexpected characters");
        }

        Ok(())
    }

    fn signed_form(
        &self,
        mut params: BTreeMap<&'static str, String>,
    ) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.config.api_secret);
        params.insert("signature", signature);
        params.insert("signature_algorithm", SIGNATURE_ALGORITHM.to_string());
        params.insert("api_key", self.config.api_key.clone());
        params
    }

    /// Fetches one page of the folder, newest first
    async fn search_page(
        &self,
        max_results: u32,
        next_cursor: Option<String>,
    ) -> PhotoStorageResult<SearchResponse> {
        let request = SearchRequest {
            expression: format!("folder:{} AND resource_type:image", self.config.folder),
            max_results,
            sort_by: [SortBy { created_at: "desc" }],
            next_cursor,
        };

        let response = self
            .client
            .post(format!("{}/resources/search", self.api_root))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .json(&request)
            .send()
            .await?;

        decode(response, PhotoStorageError::StorageRead).await
    }

    async fn post_signed(
        &self,
        endpoint: &str,
        params: BTreeMap<&'static str, String>,
    ) -> PhotoStorageResult<Response> {
        let form = self.signed_form(params);
        Ok(self
            .client
            .post(format!("{}/{endpoint}", self.api_root))
            .form(&form)
            .send()
            .await?)
    }
}

fn photo_from(resource: SearchResource) -> Photo {
    Photo {
        url: optimized_delivery_url(&resource.secure_url),
        identifier: resource.public_id,
        created_at: resource.created_at,
    }
}

/// Inserts the delivery transformation after `/upload/` in a delivery URL
fn optimized_delivery_url(secure_url: &str) -> String {
    match secure_url.split_once("/upload/") {
        Some((head, tail)) if !tail.starts_with(DELIVERY_TRANSFORMATION) => {
            format!("{head}/upload/{DELIVERY_TRANSFORMATION}/{tail}")
        }
        _ => secure_url.to_string(),
    }
}

/// Decodes a successful JSON response, classifying failures.
///
/// Auth failures, rate limiting and 5xx responses mean the host is unavailable;
/// any other error status becomes the error built by `on_error`.
async fn decode<T, F>(response: Response, on_error: F) -> PhotoStorageResult<T>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> PhotoStorageError,
{
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| on_error(format!("Malformed response: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    let message = format!("{status}: {message}");

    if matches!(
        status,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) || status.is_server_error()
    {
        Err(PhotoStorageError::BackendUnavailable(message))
    } else {
        Err(on_error(message))
    }
}

#[async_trait]
impl PhotoStorage for CloudinaryStorage {
    async fn store(&self, upload: PhotoUpload) -> PhotoStorageResult<StoredPhoto> {
        let format = upload.format()?;
        let data_uri = format!(
            "data:{};base64,{}",
            format.mime_type(),
            STANDARD.encode(&upload.bytes)
        );

        let params = BTreeMap::from([
            ("folder", self.config.folder.clone()),
            ("public_id", timestamped_name(Utc::now())),
            ("format", OUTPUT_FORMAT.to_string()),
        ]);
        let mut form = self.signed_form(params);
        form.insert("file", data_uri);

        let response = self
            .client
            .post(format!("{}/image/upload", self.api_root))
            .form(&form)
            .send()
            .await?;

        let uploaded: UploadResponse = decode(response, PhotoStorageError::StorageWrite).await?;
        debug!("Uploaded photo {}", uploaded.public_id);

        Ok(StoredPhoto {
            url: optimized_delivery_url(&uploaded.secure_url),
            identifier: uploaded.public_id,
        })
    }

    async fn list(&self) -> PhotoStorageResult<Vec<Photo>> {
        let page = self.search_page(MAX_LIST_RESULTS, None).await?;

        Ok(page.resources.into_iter().map(photo_from).collect())
    }

    async fn list_all(&self) -> PhotoStorageResult<Vec<Photo>> {
        let mut photos = Vec::new();
        let mut cursor = None;

        for _ in 0..MAX_SEARCH_PAGES {
            let page = self.search_page(MAX_SEARCH_PAGE_SIZE, cursor).await?;
            photos.extend(page.resources.into_iter().map(photo_from));

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => return Ok(photos),
            }
        }

        warn!(
            "Stopped enumerating {} after {MAX_SEARCH_PAGES} pages",
            self.config.folder
        );
        Ok(photos)
    }

    async fn delete(&self, identifier: &str) -> PhotoStorageResult<()> {
        self.validate_public_id(identifier)?;

        let params = BTreeMap::from([("public_id", identifier.to_string())]);
        let response = self.post_signed("image/destroy", params).await?;
        let destroyed: DestroyResponse = decode(response, PhotoStorageError::StorageWrite).await?;

        if destroyed.result == "ok" {
            debug!("Deleted photo {identifier}");
            Ok(())
        } else {
            warn!("Destroy of {identifier} returned {:?}", destroyed.result);
            Err(PhotoStorageError::NotFound(identifier.to_string()))
        }
    }

    fn kind(&self) -> StorageKind {
        StorageKind::Cloudinary
    }
}
