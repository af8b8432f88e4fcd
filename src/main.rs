use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use docshelf::app::{build_router, AppState};
use docshelf::auth::admin::AdminSecret;
use docshelf::config::{Config, DateFormat};
use docshelf::storage::client::{S3StorageClient, StorageClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docshelf=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();

    tracing::info!("Starting Docshelf server...");

    let admin_secret = AdminSecret::new(&config.admin_password)?;
    let date_format = DateFormat::new(config.date_format.clone())?;

    // Connect to S3
    let storage_client: Arc<dyn StorageClient> =
        Arc::new(S3StorageClient::from_config(&config.storage).await?);

    tracing::info!(bucket = %config.storage.s3_bucket, "S3 storage client initialized");

    let app_state = AppState {
        storage_client,
        admin_secret,
        date_format,
    };

    let app = build_router(
        app_state,
        config.server.max_upload_bytes,
        config.server.site_root.as_deref(),
    );

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
