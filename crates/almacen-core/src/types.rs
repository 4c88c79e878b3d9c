//! # Domain Types
//!
//! Core domain types used throughout Almacén POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │    Product      │   │      Sale       │   │  InventoryMovement  │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  id             │◄──│  SaleLineItem   │   │  product_id (FK)    │   │
//! │  │  code (unique)  │   │  (owned, 1..n)  │   │  kind ENTRADA/...   │   │
//! │  │  stock_on_hand  │   │  total_cents    │   │  quantity > 0       │   │
//! │  │  stock_minimum  │   │  payment_method │   │  resulting_stock    │   │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │     Alert       │   │   StockLevel    │ ← what the Stock Adjuster   │
//! │  │  kind, severity │   │  on_hand, min   │   returns after a change    │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row types carry money as `*_cents` integers (the column representation)
//! and expose [`Money`] accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::money::Money;
use crate::totals::SaleTotals;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,

    /// Business identifier, unique across products (`PROD-0001`).
    pub code: String,

    /// Display name.
    pub name: String,

    pub description: Option<String>,

    /// Current list price in cents.
    pub price_cents: i64,

    /// Units on hand. Never negative in a committed state.
    pub stock_on_hand: i64,

    /// Threshold at or below which a low-stock alert is raised.
    pub stock_minimum: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks if stock is at or below the configured minimum.
    pub fn is_low_on_stock(&self) -> bool {
        self.stock_on_hand <= self.stock_minimum
    }
}

/// Input for product registration.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    /// Generated as `PROD-NNNN` when absent.
    pub code: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock_on_hand: i64,
    pub stock_minimum: i64,
}

/// Partial product update. `None` keeps the stored value.
///
/// Stock on hand is deliberately absent: it only changes through the
/// Stock Adjuster so every change leaves a movement behind.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock_minimum: Option<i64>,
    pub is_active: Option<bool>,
}

/// Formats a generated product code: `PROD-0042`.
pub fn generated_product_code(sequence: i64) -> String {
    format!("{}-{:04}", crate::PRODUCT_CODE_PREFIX, sequence)
}

// =============================================================================
// Stock Level
// =============================================================================

/// Stock of one product right after a successful adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockLevel {
    pub product_id: i64,
    pub code: String,
    pub on_hand: i64,
    pub minimum: i64,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Transferencia,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Tarjeta,
        PaymentMethod::Transferencia,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::Transferencia => "transferencia",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Case-insensitive; accepts the English aliases cashiers tend to type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "efectivo" | "cash" => Ok(PaymentMethod::Efectivo),
            "tarjeta" | "card" => Ok(PaymentMethod::Tarjeta),
            "transferencia" | "transfer" => Ok(PaymentMethod::Transferencia),
            _ => Err(ValidationError::NotAllowed {
                field: "metodo_pago".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub operator_id: i64,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub amount_tendered_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Change handed back, derived from the stored amounts.
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.amount_tendered_cents - self.total_cents)
    }
}

/// A sale row plus its number of line items, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleSummary {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub sale: Sale,
    pub line_count: i64,
}

/// A line item of a sale.
/// `unit_price_cents` is a snapshot taken at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLineItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

impl SaleLineItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A sale with its line items, as returned by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleLineItem>,
}

// =============================================================================
// Sale Request
// =============================================================================

/// One requested line, as received from the caller (unvalidated).
#[derive(Debug, Clone, PartialEq)]
pub struct LineItemRequest {
    pub product_id: Option<i64>,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A "create sale" request, as received from the caller (unvalidated).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SaleRequest {
    pub operator_id: Option<i64>,
    pub lines: Vec<LineItemRequest>,
    pub payment_method: Option<String>,
    pub discount: Option<Money>,
    pub amount_tendered: Option<Money>,
}

/// A validated line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub line_total: Money,
}

/// A fully validated sale, ready for the unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSale {
    pub operator_id: i64,
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub totals: SaleTotals,
}

/// What the register prints after a committed sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleReceipt {
    pub sale_id: i64,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub amount_tendered: Money,
    pub change: Money,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementKind {
    /// Inbound (purchase, return to stock).
    Entrada,
    /// Outbound (sale, shrinkage).
    Salida,
    /// Signed correction after a recount.
    Ajuste,
}

impl MovementKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "ENTRADA",
            MovementKind::Salida => "SALIDA",
            MovementKind::Ajuste => "AJUSTE",
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ENTRADA" => Ok(MovementKind::Entrada),
            "SALIDA" => Ok(MovementKind::Salida),
            "AJUSTE" => Ok(MovementKind::Ajuste),
            _ => Err(ValidationError::NotAllowed {
                field: "tipo_movimiento".to_string(),
                allowed: vec![
                    "ENTRADA".to_string(),
                    "SALIDA".to_string(),
                    "AJUSTE".to_string(),
                ],
            }),
        }
    }
}

/// Append-only audit record of a stock change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: i64,
    pub product_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub resulting_stock: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A movement about to be appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub product_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub resulting_stock: i64,
    pub note: Option<String>,
}

/// A manual movement request (`POST /movimientos`).
///
/// For `Entrada` and `Salida`, `quantity` is a positive amount. For `Ajuste`
/// it is the signed correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRequest {
    pub product_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub note: Option<String>,
}

impl MovementRequest {
    /// The signed stock delta this movement applies.
    pub const fn delta(&self) -> i64 {
        match self.kind {
            MovementKind::Entrada => self.quantity,
            MovementKind::Salida => -self.quantity,
            MovementKind::Ajuste => self.quantity,
        }
    }
}

// =============================================================================
// Alert
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    /// At or below the configured minimum.
    StockBajo,
    /// Nothing left.
    SinStock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Info,
    Warning,
    Critical,
}

/// A stock alert awaiting (or past) acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Alert {
    pub id: i64,
    pub product_id: i64,
    pub kind: AlertKind,
    pub message: String,
    pub severity: AlertSeverity,
    pub acknowledged: bool,
    pub created_at: DateTime<Utc>,
}

/// An alert about to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub product_id: i64,
    pub kind: AlertKind,
    pub message: String,
    pub severity: AlertSeverity,
}

// =============================================================================
// System Configuration
// =============================================================================

/// One key-value setting of the system configuration table.
///
/// Values are stored as text. Structured values arrive as JSON and are
/// stored in their serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ConfigEntry {
    pub key: String,
    pub value: String,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

/// Settings restored by a configuration reset, as `(key, value)`.
pub const DEFAULT_SETTINGS: &[(&str, &str)] = &[
    ("nombre_empresa", "Inventory System"),
    ("logo_url", ""),
    ("tema", "light"),
    ("idioma", "es"),
    ("formato_fecha", "DD/MM/YYYY"),
    ("email_alertas", "true"),
    ("email_reportes", "true"),
    ("email_bajo_stock", "true"),
    ("notificaciones_push", "false"),
    ("frecuencia_reportes", "semanal"),
];

// =============================================================================
// Unit Tests
// =============================================================================
