//! Wire types of the asset host's REST API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub public_id: String,
    pub secure_url: String,
}

#[derive(Debug, Serialize)]
pub struct SearchRequest<'a> {
    pub expression: String,
    pub max_results: u32,
    pub sort_by: [SortBy<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SortBy<'a> {
    pub created_at: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub resources: Vec<SearchResource>,
    /// Present while more results follow
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchResource {
    pub public_id: String,
    pub secure_url: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DestroyResponse {
    pub result: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}
