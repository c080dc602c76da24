use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use photo_storage::PhotoStorage;
use schemars::JsonSchema;
use serde::Serialize;

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    status: String,
    /// Current version of the application
    semver: String,
    /// Commit hash of the current build (if available)
    rev: Option<String>,
    /// Active photo storage backend
    storage: String,
}

/// Health check endpoint
///
/// Reports version information and the active storage backend without
/// touching the backend itself.
pub async fn handler(
    Extension(storage): Extension<Arc<dyn PhotoStorage>>,
) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        semver: env!("CARGO_PKG_VERSION").to_string(),
        rev: option_env!("GIT_REV").map(ToString::to_string),
        storage: storage.kind().to_string(),
    })
}
