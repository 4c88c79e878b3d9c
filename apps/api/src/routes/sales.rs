//! `/ventas`: record and read sales.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::dto::{CreateSaleBody, Envelope, ListQuery, ReceiptDto, SaleDetailDto, SaleSummaryDto};
use crate::error::{ApiError, ApiResult};
use crate::extract::{IdPath, JsonBody, QueryParams};
use crate::routes::list_limit;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sales).post(create_sale))
        .route("/{id}", get(get_sale))
}

/// Records a sale. Either every line lands and stock drops, or nothing does.
pub async fn create_sale(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateSaleBody>,
) -> ApiResult<(StatusCode, Json<Envelope<ReceiptDto>>)> {
    let request = body.into_request()?;
    let receipt = state.sales.create_sale(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(ReceiptDto::from(receipt)).with_message("Venta registrada")),
    ))
}

/// Newest first.
pub async fn list_sales(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<ListQuery>,
) -> ApiResult<Json<Envelope<Vec<SaleSummaryDto>>>> {
    let sales = state.db.sales().list(list_limit(query.limit)).await?;
    Ok(Json(Envelope::ok(
        sales.into_iter().map(SaleSummaryDto::from).collect(),
    )))
}

pub async fn get_sale(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Envelope<SaleDetailDto>>> {
    let sale = state
        .db
        .sales()
        .get_with_items(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Sale not found: {id}")))?;

    Ok(Json(Envelope::ok(SaleDetailDto::from(sale))))
}
