//! Request/response DTOs and mapping to/from domain types.
//!
//! The wire format keeps the Spanish field names the register clients
//! already send. Amounts travel as decimals and become [`Money`] (cents)
//! here, before anything else sees them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use almacen_core::{
    Alert, AlertKind, AlertSeverity, ConfigEntry, InventoryMovement, LineItemRequest, Money, MovementKind,
    MovementRequest, NewProduct, PaymentMethod, Product, ProductUpdate, SaleLineItem, SaleReceipt,
    SaleRequest, SaleSummary, SaleWithItems, Sale, StockLevel, ValidationError,
};
use almacen_core::validation::{validate_setting_key, validate_setting_value};
use almacen_db::MovementOutcome;

// -------------------------
// Envelope
// -------------------------

/// Success envelope: `{ success: true, data, message? }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Converts a decimal amount from the wire, naming the field on failure.
fn money(field: &str, amount: f64) -> Result<Money, ValidationError> {
    Money::from_decimal(amount).ok_or_else(|| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "not a representable amount".to_string(),
    })
}

fn optional_money(field: &str, amount: Option<f64>) -> Result<Option<Money>, ValidationError> {
    amount.map(|a| money(field, a)).transpose()
}

// -------------------------
// Sales
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SaleLineBody {
    pub producto_id: Option<i64>,
    #[serde(default)]
    pub cantidad: i64,
    pub precio: Option<f64>,
}

/// `POST /ventas` body.
#[derive(Debug, Deserialize)]
pub struct CreateSaleBody {
    pub usuario_id: Option<i64>,
    #[serde(default)]
    pub detalles: Vec<SaleLineBody>,
    pub metodo_pago: Option<String>,
    pub monto_recibido: Option<f64>,
    pub descuento: Option<f64>,
}

impl CreateSaleBody {
    pub fn into_request(self) -> Result<SaleRequest, ValidationError> {
        let lines = self
            .detalles
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let field = format!("detalles[{i}].precio");
                let precio = line
                    .precio
                    .ok_or_else(|| ValidationError::required(field.as_str()))?;
                Ok(LineItemRequest {
                    product_id: line.producto_id,
                    quantity: line.cantidad,
                    unit_price: money(&field, precio)?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(SaleRequest {
            operator_id: self.usuario_id,
            lines,
            payment_method: self.metodo_pago,
            discount: optional_money("descuento", self.descuento)?,
            amount_tendered: optional_money("monto_recibido", self.monto_recibido)?,
        })
    }
}

/// What the register prints after `POST /ventas`.
#[derive(Debug, Serialize)]
pub struct ReceiptDto {
    pub id: i64,
    pub total: f64,
    pub subtotal: f64,
    pub descuento: f64,
    pub monto_recibido: f64,
    pub cambio: f64,
    pub metodo_pago: PaymentMethod,
    pub fecha: DateTime<Utc>,
}

impl From<SaleReceipt> for ReceiptDto {
    fn from(r: SaleReceipt) -> Self {
        ReceiptDto {
            id: r.sale_id,
            total: r.total.to_decimal(),
            subtotal: r.subtotal.to_decimal(),
            descuento: r.discount.to_decimal(),
            monto_recibido: r.amount_tendered.to_decimal(),
            cambio: r.change.to_decimal(),
            metodo_pago: r.payment_method,
            fecha: r.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleDto {
    pub id: i64,
    pub usuario_id: i64,
    pub subtotal: f64,
    pub descuento: f64,
    pub total: f64,
    pub metodo_pago: PaymentMethod,
    pub monto_recibido: f64,
    pub cambio: f64,
    pub fecha: DateTime<Utc>,
}

impl From<Sale> for SaleDto {
    fn from(s: Sale) -> Self {
        SaleDto {
            id: s.id,
            usuario_id: s.operator_id,
            subtotal: Money::from_cents(s.subtotal_cents).to_decimal(),
            descuento: Money::from_cents(s.discount_cents).to_decimal(),
            total: s.total().to_decimal(),
            metodo_pago: s.payment_method,
            monto_recibido: Money::from_cents(s.amount_tendered_cents).to_decimal(),
            cambio: s.change().to_decimal(),
            fecha: s.created_at,
        }
    }
}

/// Row of `GET /ventas`.
#[derive(Debug, Serialize)]
pub struct SaleSummaryDto {
    #[serde(flatten)]
    pub venta: SaleDto,
    pub cantidad_items: i64,
}

impl From<SaleSummary> for SaleSummaryDto {
    fn from(s: SaleSummary) -> Self {
        SaleSummaryDto {
            venta: s.sale.into(),
            cantidad_items: s.line_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleItemDto {
    pub id: i64,
    pub producto_id: i64,
    pub cantidad: i64,
    pub precio_unitario: f64,
    pub subtotal: f64,
}

impl From<SaleLineItem> for SaleItemDto {
    fn from(item: SaleLineItem) -> Self {
        SaleItemDto {
            id: item.id,
            producto_id: item.product_id,
            cantidad: item.quantity,
            precio_unitario: item.unit_price().to_decimal(),
            subtotal: item.line_total().to_decimal(),
        }
    }
}

/// `GET /ventas/{id}`.
#[derive(Debug, Serialize)]
pub struct SaleDetailDto {
    #[serde(flatten)]
    pub venta: SaleDto,
    pub detalles: Vec<SaleItemDto>,
}

impl From<SaleWithItems> for SaleDetailDto {
    fn from(s: SaleWithItems) -> Self {
        SaleDetailDto {
            venta: s.sale.into(),
            detalles: s.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// `?limit=` on list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
}

// -------------------------
// Products
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductBody {
    pub codigo: Option<String>,
    #[serde(default)]
    pub nombre: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub precio: f64,
    #[serde(default)]
    pub stock_actual: i64,
    #[serde(default)]
    pub stock_minimo: i64,
}

impl CreateProductBody {
    pub fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        Ok(NewProduct {
            code: self.codigo,
            name: self.nombre,
            description: self.descripcion,
            price: money("precio", self.precio)?,
            stock_on_hand: self.stock_actual,
            stock_minimum: self.stock_minimo,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductBody {
    pub codigo: Option<String>,
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<f64>,
    pub stock_minimo: Option<i64>,
    pub activo: Option<bool>,
    /// Accepted only to be refused with a useful message.
    pub stock_actual: Option<i64>,
}

impl UpdateProductBody {
    pub fn into_update(self) -> Result<ProductUpdate, ValidationError> {
        if self.stock_actual.is_some() {
            return Err(ValidationError::InvalidFormat {
                field: "stock_actual".to_string(),
                reason: "stock changes are recorded through /movimientos".to_string(),
            });
        }

        Ok(ProductUpdate {
            code: self.codigo,
            name: self.nombre,
            description: self.descripcion,
            price: optional_money("precio", self.precio)?,
            stock_minimum: self.stock_minimo,
            is_active: self.activo,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ProductDto {
    pub id: i64,
    pub codigo: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: f64,
    pub stock_actual: i64,
    pub stock_minimo: i64,
    pub stock_bajo: bool,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            stock_bajo: p.is_low_on_stock(),
            precio: p.price().to_decimal(),
            id: p.id,
            codigo: p.code,
            nombre: p.name,
            descripcion: p.description,
            stock_actual: p.stock_on_hand,
            stock_minimo: p.stock_minimum,
            activo: p.is_active,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

// -------------------------
// Movements
// -------------------------

/// `POST /movimientos` body. `tipo_movimiento` is parsed here so an
/// unknown kind is a validation error rather than a deserialization one.
#[derive(Debug, Deserialize)]
pub struct CreateMovementBody {
    pub producto_id: Option<i64>,
    pub tipo_movimiento: Option<String>,
    #[serde(default)]
    pub cantidad: i64,
    pub observaciones: Option<String>,
}

impl CreateMovementBody {
    pub fn into_request(self) -> Result<MovementRequest, ValidationError> {
        let product_id = self
            .producto_id
            .ok_or_else(|| ValidationError::required("producto_id"))?;
        let kind = self
            .tipo_movimiento
            .ok_or_else(|| ValidationError::required("tipo_movimiento"))?
            .parse::<MovementKind>()?;

        Ok(MovementRequest {
            product_id,
            kind,
            quantity: self.cantidad,
            note: self.observaciones,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MovementQuery {
    pub tipo: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct MovementDto {
    pub id: i64,
    pub producto_id: i64,
    pub tipo_movimiento: MovementKind,
    pub cantidad: i64,
    pub stock_resultante: i64,
    pub observaciones: Option<String>,
    pub fecha: DateTime<Utc>,
}

impl From<InventoryMovement> for MovementDto {
    fn from(m: InventoryMovement) -> Self {
        MovementDto {
            id: m.id,
            producto_id: m.product_id,
            tipo_movimiento: m.kind,
            cantidad: m.quantity,
            stock_resultante: m.resulting_stock,
            observaciones: m.note,
            fecha: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockLevelDto {
    pub producto_id: i64,
    pub codigo: String,
    pub stock_actual: i64,
    pub stock_minimo: i64,
}

impl From<StockLevel> for StockLevelDto {
    fn from(l: StockLevel) -> Self {
        StockLevelDto {
            producto_id: l.product_id,
            codigo: l.code,
            stock_actual: l.on_hand,
            stock_minimo: l.minimum,
        }
    }
}

/// `POST /movimientos` response.
#[derive(Debug, Serialize)]
pub struct MovementOutcomeDto {
    pub movimiento: MovementDto,
    pub stock: StockLevelDto,
    pub alerta: Option<AlertDto>,
}

impl From<MovementOutcome> for MovementOutcomeDto {
    fn from(o: MovementOutcome) -> Self {
        MovementOutcomeDto {
            movimiento: o.movement.into(),
            stock: o.level.into(),
            alerta: o.alert.map(Into::into),
        }
    }
}

// -------------------------
// Alerts
// -------------------------

#[derive(Debug, Serialize)]
pub struct AlertDto {
    pub id: i64,
    pub producto_id: i64,
    pub tipo_alerta: AlertKind,
    pub mensaje: String,
    pub nivel: AlertSeverity,
    pub atendida: bool,
    pub fecha: DateTime<Utc>,
}

impl From<Alert> for AlertDto {
    fn from(a: Alert) -> Self {
        AlertDto {
            id: a.id,
            producto_id: a.product_id,
            tipo_alerta: a.kind,
            mensaje: a.message,
            nivel: a.severity,
            atendida: a.acknowledged,
            fecha: a.created_at,
        }
    }
}

// -------------------------
// Configuration
// -------------------------

/// One setting inside the `GET /configuracion` map.
#[derive(Debug, Serialize)]
pub struct SettingDto {
    pub valor: String,
    pub descripcion: String,
    pub fecha_actualizacion: DateTime<Utc>,
}

/// A single setting addressed by key.
#[derive(Debug, Serialize)]
pub struct SettingEntryDto {
    pub clave: String,
    pub valor: String,
    pub descripcion: String,
    pub fecha_actualizacion: DateTime<Utc>,
}

impl From<ConfigEntry> for SettingEntryDto {
    fn from(e: ConfigEntry) -> Self {
        SettingEntryDto {
            clave: e.key,
            valor: e.value,
            descripcion: e.description,
            fecha_actualizacion: e.updated_at,
        }
    }
}

/// Keys the settings map by `clave`, in key order.
pub fn settings_map(entries: Vec<ConfigEntry>) -> BTreeMap<String, SettingDto> {
    entries
        .into_iter()
        .map(|e| {
            (
                e.key,
                SettingDto {
                    valor: e.value,
                    descripcion: e.description,
                    fecha_actualizacion: e.updated_at,
                },
            )
        })
        .collect()
}

/// Stored text of a setting value: strings as-is, anything else as JSON.
fn setting_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// `PUT /configuracion` body: `{ clave: valor, ... }`.
pub fn settings_from_body(body: Map<String, Value>) -> Result<Vec<(String, String)>, ValidationError> {
    body.into_iter()
        .map(|(key, value)| {
            let key = validate_setting_key(&key)?;
            let text = setting_text(value);
            validate_setting_value(&key, &text)?;
            Ok((key, text))
        })
        .collect()
}

/// `PUT /configuracion/{clave}` body.
#[derive(Debug, Deserialize)]
pub struct UpsertSettingBody {
    pub valor: Option<Value>,
    pub descripcion: Option<String>,
}

impl UpsertSettingBody {
    /// Returns `(value, description)` as stored text.
    pub fn into_parts(self) -> Result<(String, Option<String>), ValidationError> {
        let value = match self.valor {
            None | Some(Value::Null) => return Err(ValidationError::required("valor")),
            Some(v) => setting_text(v),
        };
        validate_setting_value("valor", &value)?;
        if let Some(d) = &self.descripcion {
            validate_setting_value("descripcion", d)?;
        }
        Ok((value, self.descripcion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_body_converts_decimals_to_cents() {
        let body: CreateSaleBody = serde_json::from_value(serde_json::json!({
            "usuario_id": 1,
            "detalles": [{ "producto_id": 10, "cantidad": 3, "precio": 12.5 }],
            "metodo_pago": "efectivo",
            "monto_recibido": 40,
            "descuento": 0.1
        }))
        .unwrap();

        let request = body.into_request().unwrap();
        assert_eq!(request.operator_id, Some(1));
        assert_eq!(request.lines[0].unit_price.cents(), 1_250);
        assert_eq!(request.amount_tendered, Some(Money::from_cents(4_000)));
        assert_eq!(request.discount, Some(Money::from_cents(10)));
    }

    #[test]
    fn test_sale_line_requires_price() {
        let body: CreateSaleBody = serde_json::from_value(serde_json::json!({
            "usuario_id": 1,
            "detalles": [
                { "producto_id": 10, "cantidad": 1, "precio": 2.0 },
                { "producto_id": 11, "cantidad": 1 }
            ]
        }))
        .unwrap();

        assert_eq!(
            body.into_request().unwrap_err(),
            ValidationError::required("detalles[1].precio")
        );
    }

    #[test]
    fn test_missing_detalles_is_left_to_validation() {
        let body: CreateSaleBody =
            serde_json::from_value(serde_json::json!({ "usuario_id": 1 })).unwrap();
        let request = body.into_request().unwrap();
        assert!(request.lines.is_empty());
        assert!(request.payment_method.is_none());
    }

    #[test]
    fn test_update_refuses_stock() {
        let body = UpdateProductBody {
            stock_actual: Some(5),
            ..Default::default()
        };
        let err = body.into_update().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { field, .. } if field == "stock_actual"));
    }

    #[test]
    fn test_movement_body_parses_kind() {
        let body: CreateMovementBody = serde_json::from_value(serde_json::json!({
            "producto_id": 2,
            "tipo_movimiento": "ajuste",
            "cantidad": -3
        }))
        .unwrap();
        let request = body.into_request().unwrap();
        assert_eq!(request.kind, MovementKind::Ajuste);
        assert_eq!(request.delta(), -3);

        let body: CreateMovementBody = serde_json::from_value(serde_json::json!({
            "producto_id": 2,
            "tipo_movimiento": "ROBO",
            "cantidad": 1
        }))
        .unwrap();
        assert!(matches!(
            body.into_request().unwrap_err(),
            ValidationError::NotAllowed { .. }
        ));
    }

    #[test]
    fn test_settings_body_stringifies_structured_values() {
        let body = serde_json::json!({
            "tema": "dark",
            "notificaciones_push": true,
            "horario": { "abre": "08:00" }
        });
        let Value::Object(map) = body else { unreachable!() };

        let settings = settings_from_body(map).unwrap();
        let lookup = |k: &str| settings.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(lookup("tema"), Some("dark"));
        assert_eq!(lookup("notificaciones_push"), Some("true"));
        assert_eq!(lookup("horario"), Some(r#"{"abre":"08:00"}"#));
    }

    #[test]
    fn test_upsert_setting_requires_value() {
        let body: UpsertSettingBody =
            serde_json::from_value(serde_json::json!({ "descripcion": "x" })).unwrap();
        assert_eq!(body.into_parts().unwrap_err(), ValidationError::required("valor"));

        let body: UpsertSettingBody =
            serde_json::from_value(serde_json::json!({ "valor": 30 })).unwrap();
        assert_eq!(body.into_parts().unwrap(), ("30".to_string(), None));
    }

    #[test]
    fn test_envelope_omits_empty_message() {
        let json = serde_json::to_value(Envelope::ok(1)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 1 }));

        let json = serde_json::to_value(Envelope::ok(1).with_message("listo")).unwrap();
        assert_eq!(json["message"], "listo");
    }
}
