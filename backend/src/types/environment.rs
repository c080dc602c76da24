//! Environment configuration for different deployment stages

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use photo_storage::cloudinary::DEFAULT_API_BASE;
use photo_storage::CloudinaryConfig;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::retention_sweeper::RetentionPolicy;

/// Errors in the process environment
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is not set
    #[error("{0} environment variable is not set")]
    Missing(&'static str),

    /// Variable is set but cannot be parsed
    #[error("Invalid value for {name}: {value:?}")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value
        value: String,
    },
}

/// Which storage backend the server runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageMode {
    /// Files in `UPLOADS_DIR`, served under `/uploads`
    Local,
    /// Remote asset host
    Cloudinary,
}

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 15 * 1024 * 1024;

/// Reads and parses an optional variable, `Ok(None)` when unset or blank
fn parse_var<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(None),
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::Missing(name))
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Whether logs are emitted as JSON
    #[must_use]
    pub const fn json_logs(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }

    /// Listening port from `PORT`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `PORT` is not a valid port number
    pub fn port(&self) -> Result<u16, ConfigError> {
        Ok(parse_var("PORT")?.unwrap_or(DEFAULT_PORT))
    }

    /// Base URL for absolute local photo links, from `BASE_URL`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the fallback needs `PORT` and it is invalid
    pub fn base_url(&self) -> Result<String, ConfigError> {
        match required_var("BASE_URL") {
            Ok(base_url) => Ok(base_url.trim().trim_end_matches('/').to_string()),
            Err(_) => Ok(format!("http://localhost:{}", self.port()?)),
        }
    }

    /// Storage backend selection from `STORAGE_MODE`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for anything but `local` or `cloudinary`
    pub fn storage_mode(&self) -> Result<StorageMode, ConfigError> {
        Ok(parse_var("STORAGE_MODE")?.unwrap_or(StorageMode::Local))
    }

    /// Directory for the local disk backend, from `UPLOADS_DIR`
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        required_var("UPLOADS_DIR").map_or_else(|_| PathBuf::from(DEFAULT_UPLOADS_DIR), PathBuf::from)
    }

    /// Remote asset host credentials
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if any `CLOUDINARY_*` credential is unset
    pub fn cloudinary_config(&self) -> Result<CloudinaryConfig, ConfigError> {
        let mut config = CloudinaryConfig::new(
            required_var("CLOUDINARY_CLOUD_NAME")?,
            required_var("CLOUDINARY_API_KEY")?,
            required_var("CLOUDINARY_API_SECRET")?,
        );
        config.api_base =
            required_var("CLOUDINARY_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Ok(config)
    }

    /// Maximum accepted request body size in bytes
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `MAX_UPLOAD_BYTES` is not a number
    pub fn max_upload_bytes(&self) -> Result<usize, ConfigError> {
        Ok(parse_var("MAX_UPLOAD_BYTES")?.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES))
    }

    /// Retention sweep settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if any `RETENTION_*` variable is malformed
    pub fn retention_policy(&self) -> Result<RetentionPolicy, ConfigError> {
        let defaults = RetentionPolicy::default();

        Ok(RetentionPolicy {
            enabled: parse_var("RETENTION_ENABLED")?.unwrap_or(defaults.enabled),
            max_age: parse_var::<u32>("RETENTION_MAX_AGE_DAYS")?
                .map_or(defaults.max_age, |days| chrono::Duration::days(i64::from(days))),
            interval: parse_var::<u64>("RETENTION_SWEEP_INTERVAL_SECS")?
                .filter(|secs| *secs > 0)
                .map_or(defaults.interval, Duration::from_secs),
        })
    }
}
