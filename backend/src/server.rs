use std::time::Duration;

use aide::openapi::OpenApi;
use axum::{extract::DefaultBodyLimit, Extension, Router};
use datadog_tracing::axum::{OtelAxumLayer, OtelInResponseLayer};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, services::ServeDir, timeout::TimeoutLayer};

use crate::photo_backend::{PhotoBackend, UPLOADS_ROUTE};
use crate::routes;
use crate::types::Environment;

/// Upper bound for a single request, generous enough for slow uploads
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds the application router with its state and, for local disk storage,
/// static serving of the uploads directory
pub fn router(
    environment: Environment,
    photo_backend: &PhotoBackend,
    max_upload_bytes: usize,
) -> Router {
    let mut openapi = OpenApi::default();

    let router = routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(photo_backend.storage.clone()))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let router = match &photo_backend.static_dir {
        Some(dir) => router.nest_service(UPLOADS_ROUTE, ServeDir::new(dir)),
        None => router,
    };

    // The booth UI is served from its own origin
    router.layer(CorsLayer::permissive())
}

/// Starts the server with the given environment and photo backend
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the server fails to
/// start or bind to the port
pub async fn start(
    environment: Environment,
    photo_backend: PhotoBackend,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let port = environment.port()?;
    let max_upload_bytes = environment.max_upload_bytes()?;

    let router = router(environment, &photo_backend, max_upload_bytes)
        // Include trace context as header into the response
        .layer(OtelInResponseLayer)
        // Start OpenTelemetry trace on incoming request
        .layer(OtelAxumLayer::default())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("📸 Photo Booth Backend started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(anyhow::Error::from)
}
