//! `/movimientos`: the stock movement log and manual movements.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use almacen_core::MovementKind;

use crate::dto::{CreateMovementBody, Envelope, MovementDto, MovementOutcomeDto, MovementQuery};
use crate::error::ApiResult;
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::routes::list_limit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_movements).post(create_movement))
        .route("/producto/{id}", get(list_product_movements))
}

/// Newest first, optionally filtered by `?tipo=ENTRADA|SALIDA|AJUSTE`.
pub async fn list_movements(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<MovementQuery>,
) -> ApiResult<Json<Envelope<Vec<MovementDto>>>> {
    let kind = query
        .tipo
        .as_deref()
        .map(str::parse::<MovementKind>)
        .transpose()?;

    let movements = state
        .db
        .movements()
        .list(kind, list_limit(query.limit))
        .await?;

    Ok(Json(Envelope::ok(
        movements.into_iter().map(MovementDto::from).collect(),
    )))
}

pub async fn list_product_movements(
    State(state): State<AppState>,
    IdPath(product_id): IdPath,
) -> ApiResult<Json<Envelope<Vec<MovementDto>>>> {
    let movements = state.db.movements().list_by_product(product_id).await?;
    Ok(Json(Envelope::ok(
        movements.into_iter().map(MovementDto::from).collect(),
    )))
}

/// Applies a manual movement and returns it with the resulting stock.
pub async fn create_movement(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateMovementBody>,
) -> ApiResult<(StatusCode, Json<Envelope<MovementOutcomeDto>>)> {
    let request = body.into_request()?;
    let outcome = state.stock.apply_movement(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(MovementOutcomeDto::from(outcome)).with_message("Movimiento registrado")),
    ))
}
