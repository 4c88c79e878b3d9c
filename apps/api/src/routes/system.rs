//! `/health`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MigrationsDto {
    pub total: usize,
    pub applied: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationsDto>,
}

/// 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthDto>) {
    if !state.db.health_check().await {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthDto {
                status: "error",
                database: "disconnected",
                migrations: None,
            }),
        );
    }

    let migrations = state
        .db
        .migration_status()
        .await
        .ok()
        .map(|(total, applied)| MigrationsDto { total, applied });

    (
        StatusCode::OK,
        Json(HealthDto {
            status: "ok",
            database: "connected",
            migrations,
        }),
    )
}
