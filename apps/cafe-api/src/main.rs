//! # Café API
//!
//! Entry point: configuration, database, HTTP server with graceful shutdown.

use std::net::SocketAddr;

use tracing::{info, warn};

use cafe_api::{build_router, init_tracing, ApiConfig, AppState};
use cafe_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Café API server...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        port = config.http_port,
        db_path = %config.db_path,
        auth = config.jwt_secret.is_some(),
        surcharge = ?config.surcharge,
        "Configuration loaded"
    );
    if config.jwt_secret.is_none() {
        warn!("CAFE_JWT_SECRET not set, /api routes are unauthenticated");
    }

    // Connect to database (migrations run on connect)
    let db = Database::new(DbConfig::new(&config.db_path)).await?;
    info!("Database ready");

    let state = AppState::new(db.clone(), &config);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
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
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
