//! # Almacén POS API server
//!
//! Loads configuration, opens the database (running migrations) and serves
//! the REST API until Ctrl+C or SIGTERM.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use almacen_api::{build_app, telemetry, ApiConfig, AppState};
use almacen_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    telemetry::init(config.log_format);

    info!(
        port = config.port,
        database = %config.database_path.display(),
        sale_timeout_ms = config.sale_timeout_ms,
        alerts_enabled = config.alerts_enabled,
        "Starting Almacén POS API"
    );

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("failed to open database")?;

    let app = build_app(AppState::new(db.clone(), &config));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
