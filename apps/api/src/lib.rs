//! # almacen-api
//!
//! REST adapter for Almacén POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                            HTTP API                                     │
//! │                                                                         │
//! │  client ──► axum Router ──► handler ──► almacen-db ──► SQLite           │
//! │              (routes/)       │                                          │
//! │                              ├── dto.rs    Spanish wire names, decimals │
//! │                              └── error.rs  ApiError envelope            │
//! │                                                                         │
//! │  Every route is served at `/x` and at `/api/x`.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables (see [`config::ApiConfig`]):
//! - `PORT`, `BIND_ADDR` - listener
//! - `DATABASE_PATH`, `DB_MAX_CONNECTIONS` - SQLite pool
//! - `SALE_TIMEOUT_MS` - deadline for one sale
//! - `ALERTS_ENABLED` - low-stock alerts on/off
//! - `LOG_FORMAT` - `pretty` or `json`; `RUST_LOG` sets the filter

use axum::Router;

pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use config::{ApiConfig, ConfigError, LogFormat};
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the full HTTP router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::router())
        .nest("/api", routes::router())
        .with_state(state)
}
