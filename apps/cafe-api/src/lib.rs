//! # cafe-api: REST Server for the Café Back Office
//!
//! Thin orchestration layer: handlers load data through cafe-db, run the
//! pure calculators from cafe-core, and return JSON.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Café API Server                                  │
//! │                                                                         │
//! │  React SPA ───► HTTP (8080) ───► CORS ─► Trace ─► JWT ─► Routes        │
//! │                                                             │           │
//! │                              ┌──────────────────────────────┤           │
//! │                              ▼                              ▼           │
//! │                     cafe-db repositories         cafe-core calculators │
//! │                              │                    (pricing, bill,      │
//! │                              ▼                     reporting)          │
//! │                           SQLite                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,cafe=debug,sqlx=warn";

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/orders", routes::orders::router())
        .nest("/api/reports", routes::reports::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Initializes the global tracing subscriber.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests;
