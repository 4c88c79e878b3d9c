//! `/configuracion`: key-value system settings.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value};

use almacen_core::validation::validate_setting_key;

use crate::dto::{
    settings_from_body, settings_map, Envelope, SettingDto, SettingEntryDto, UpsertSettingBody,
};
use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, KeyPath};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings).put(update_settings))
        .route("/reset", post(reset_settings))
        .route("/{clave}", get(get_setting).put(upsert_setting))
}

/// Every setting, keyed by `clave`.
pub async fn list_settings(
    State(state): State<AppState>,
) -> ApiResult<Json<Envelope<BTreeMap<String, SettingDto>>>> {
    let entries = state.db.config().list().await?;
    Ok(Json(Envelope::ok(settings_map(entries))))
}

pub async fn get_setting(
    State(state): State<AppState>,
    KeyPath(key): KeyPath,
) -> ApiResult<Json<Envelope<SettingEntryDto>>> {
    let key = validate_setting_key(&key)?;
    let entry = state
        .db
        .config()
        .get(&key)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Setting not found: {key}")))?;

    Ok(Json(Envelope::ok(SettingEntryDto::from(entry))))
}

/// Updates existing keys only; unknown keys are ignored.
/// Answers with the keys that changed.
pub async fn update_settings(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Map<String, Value>>,
) -> ApiResult<Json<Envelope<Vec<String>>>> {
    let settings = settings_from_body(body)?;
    let updated = state.db.config().update_many(&settings).await?;

    Ok(Json(
        Envelope::ok(updated).with_message("Configuración actualizada"),
    ))
}

/// Creates the key when missing.
pub async fn upsert_setting(
    State(state): State<AppState>,
    KeyPath(key): KeyPath,
    JsonBody(body): JsonBody<UpsertSettingBody>,
) -> ApiResult<Json<Envelope<SettingEntryDto>>> {
    let key = validate_setting_key(&key)?;
    let (value, description) = body.into_parts()?;
    let entry = state
        .db
        .config()
        .upsert(&key, &value, description.as_deref())
        .await?;

    Ok(Json(
        Envelope::ok(SettingEntryDto::from(entry)).with_message("Configuración actualizada"),
    ))
}

pub async fn reset_settings(State(state): State<AppState>) -> ApiResult<Json<Envelope<Vec<String>>>> {
    let keys = state.db.config().reset_defaults().await?;

    Ok(Json(
        Envelope::ok(keys).with_message("Configuración restablecida a valores por defecto"),
    ))
}
