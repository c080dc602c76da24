use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use photo_booth_backend::{photo_backend::PhotoBackend, server, types::Environment};
use photo_storage::PhotoStorage;
use tempfile::TempDir;
use tower::ServiceExt;

use super::utils::{multipart_body, parse_response_body, MULTIPART_BOUNDARY};

pub const TEST_BASE_URL: &str = "http://localhost:3001";

/// Body limit used by test routers
pub const TEST_MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router over a local disk backend in a fresh temp directory
pub struct TestSetup {
    pub router: Router,
    pub storage: Arc<dyn PhotoStorage>,
    // Keep the uploads directory alive for the duration of the test
    pub uploads_dir: Option<TempDir>,
}

impl TestSetup {
    pub async fn new() -> Self {
        setup_test_env();

        let uploads_dir = tempfile::tempdir().expect("Failed to create uploads dir");
        let photo_backend = PhotoBackend::local(uploads_dir.path().to_path_buf(), TEST_BASE_URL)
            .await
            .expect("Failed to create local backend");

        Self {
            router: server::router(
                Environment::Development,
                &photo_backend,
                TEST_MAX_UPLOAD_BYTES,
            ),
            storage: photo_backend.storage,
            uploads_dir: Some(uploads_dir),
        }
    }

    /// Router over an arbitrary storage, without static file serving
    pub fn with_storage(storage: Arc<dyn PhotoStorage>) -> Self {
        setup_test_env();

        let photo_backend = PhotoBackend {
            storage: storage.clone(),
            static_dir: None,
        };

        Self {
            router: server::router(
                Environment::Development,
                &photo_backend,
                TEST_MAX_UPLOAD_BYTES,
            ),
            storage,
            uploads_dir: None,
        }
    }

    pub async fn send_request(
        &self,
        request: Request<Body>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        Ok(self.router.clone().oneshot(request).await?)
    }

    pub async fn send_upload(
        &self,
        field: &str,
        file_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri("/api/upload")
            .method("POST")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            )
            .body(Body::from(multipart_body(field, file_name, content_type, data)))?;

        self.send_request(request).await
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        self.send_request(request).await
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("DELETE")
            .body(Body::empty())?;
        self.send_request(request).await
    }

    /// Lists photos through the API and returns the JSON array
    pub async fn list_photos(&self) -> Vec<serde_json::Value> {
        let response = self
            .send_get_request("/api/photos")
            .await
            .expect("Failed to list photos");
        assert_eq!(response.status(), http::StatusCode::OK);
        parse_response_body(response)
            .await
            .as_array()
            .cloned()
            .expect("Photo list should be an array")
    }
}
