use datadog_tracing::axum::shutdown_signal;
use photo_booth_backend::{
    photo_backend::PhotoBackend, retention_sweeper::RetentionSweeper, server, types::Environment,
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // JSON logs for staging/production (Datadog), plain output for development
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    info!("Starting Photo Booth Backend in {:?} environment", environment);

    let photo_backend = PhotoBackend::from_environment(&environment).await?;
    let retention_policy = environment.retention_policy()?;

    // Single shutdown token for the server and the sweeper
    let shutdown_token = CancellationToken::new();
    let signal_token = shutdown_token.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutting down Photo Booth Backend...");
        signal_token.cancel();
    });

    let sweeper_handle = if retention_policy.enabled {
        let sweeper = RetentionSweeper::new(
            photo_backend.storage.clone(),
            retention_policy,
            shutdown_token.clone(),
        );
        Some(tokio::spawn(sweeper.start()))
    } else {
        info!("Retention sweeper disabled");
        None
    };

    let server_result = server::start(environment, photo_backend, shutdown_token.clone()).await;

    // Stop the sweeper as well if the server exited on its own
    shutdown_token.cancel();
    if let Some(handle) = sweeper_handle {
        handle.await.ok();
    }

    info!("✅ Photo Booth Backend shutdown complete");

    server_result
}
