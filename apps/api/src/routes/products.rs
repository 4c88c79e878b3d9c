//! `/productos`: catalogue CRUD.
//!
//! Stock is read-only here. It changes through sales and `/movimientos`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use almacen_core::validation::{validate_new_product, validate_product_update};

use crate::dto::{CreateProductBody, Envelope, ProductDto, UpdateProductBody};
use crate::error::{ApiError, ApiResult};
use crate::extract::{IdPath, JsonBody};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

/// Active products ordered by name.
pub async fn list_products(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<Vec<ProductDto>>>> {
    let products = state.db.products().list_active().await?;
    Ok(Json(Envelope::ok(
        products.into_iter().map(ProductDto::from).collect(),
    )))
}

pub async fn get_product(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Envelope<ProductDto>>> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {id}")))?;

    Ok(Json(Envelope::ok(ProductDto::from(product))))
}

pub async fn create_product(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CreateProductBody>,
) -> ApiResult<(StatusCode, Json<Envelope<ProductDto>>)> {
    let product = validate_new_product(body.into_new_product()?)?;
    let created = state.db.products().create(product).await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(ProductDto::from(created)).with_message("Producto creado")),
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    IdPath(id): IdPath,
    JsonBody(body): JsonBody<UpdateProductBody>,
) -> ApiResult<Json<Envelope<ProductDto>>> {
    let update = validate_product_update(body.into_update()?)?;
    let updated = state.db.products().update(id, update).await?;

    Ok(Json(
        Envelope::ok(ProductDto::from(updated)).with_message("Producto actualizado"),
    ))
}

/// Soft delete: the row stays for the sales that reference it.
pub async fn delete_product(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    state.db.products().soft_delete(id).await?;

    Ok(Json(
        Envelope::ok(serde_json::json!({ "id": id })).with_message("Producto eliminado"),
    ))
}
