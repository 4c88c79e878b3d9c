//! `/alertas`: low-stock alerts.

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::dto::{AlertDto, Envelope};
use crate::error::ApiResult;
use crate::extract::IdPath;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_alerts))
        .route("/activas", get(list_active_alerts))
        .route("/producto/{id}", get(list_product_alerts))
        .route("/{id}/atender", put(acknowledge_alert))
}

fn to_dtos(alerts: Vec<almacen_core::Alert>) -> Vec<AlertDto> {
    alerts.into_iter().map(AlertDto::from).collect()
}

pub async fn list_alerts(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<AlertDto>>>> {
    let alerts = state.db.alerts().list().await?;
    Ok(Json(Envelope::ok(to_dtos(alerts))))
}

/// Unacknowledged alerts, most severe first.
pub async fn list_active_alerts(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<AlertDto>>>> {
    let alerts = state.db.alerts().list_active().await?;
    Ok(Json(Envelope::ok(to_dtos(alerts))))
}

pub async fn list_product_alerts(
    State(state): State<AppState>,
    IdPath(product_id): IdPath,
) -> ApiResult<Json<Envelope<Vec<AlertDto>>>> {
    let alerts = state.db.alerts().list_by_product(product_id).await?;
    Ok(Json(Envelope::ok(to_dtos(alerts))))
}

pub async fn acknowledge_alert(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Envelope<AlertDto>>> {
    let alert = state.db.alerts().acknowledge(id).await?;
    Ok(Json(
        Envelope::ok(AlertDto::from(alert)).with_message("Alerta atendida"),
    ))
}
