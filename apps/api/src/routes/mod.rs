//! HTTP routes, one file per resource.

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub mod alerts;
pub mod config;
pub mod movements;
pub mod products;
pub mod sales;
pub mod system;

/// Rows returned by list endpoints when `?limit=` is absent.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Upper bound for `?limit=`.
pub const MAX_LIST_LIMIT: u32 = 500;

pub(crate) fn list_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

/// Every resource route. Mounted once at `/` and once under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(system::health))
        .nest("/ventas", sales::router())
        .nest("/productos", products::router())
        .nest("/movimientos", movements::router())
        .nest("/alertas", alerts::router())
        .nest("/configuracion", config::router())
}
