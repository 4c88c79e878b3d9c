//! # almacen-core: Pure Business Logic for Almacén POS
//!
//! Everything the backend knows about money, sales, stock and alerts that
//! does not need a database or a network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Almacén POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum)                              │   │
//! │  │   POST /ventas ─ /productos ─ /movimientos ─ /alertas           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    almacen-db                                   │   │
//! │  │   SaleCoordinator ─► LedgerUnit ─► StockAdjuster (SQLite)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ almacen-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌────────┐  ┌──────┐ │   │
//! │  │   │  types  │  │  money  │  │validation│  │ totals │  │alert │ │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘  └────────┘  └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, InventoryMovement, Alert, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Sale subtotal / total / change computation
//! - [`validation`] - Business rule validation
//! - [`alert`] - Stock-change observer and the low-stock policy
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use almacen_core::money::Money;
//! use almacen_core::totals::SaleTotals;
//!
//! let lines = [(3, Money::from_cents(10_000))];
//! let totals = SaleTotals::compute(lines, Money::zero(), Some(Money::from_cents(30_000))).unwrap();
//!
//! assert_eq!(totals.total.cents(), 30_000);
//! assert!(totals.change.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod alert;
pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use alert::{LowStockPolicy, StockObserver};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use totals::SaleTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items in a single sale.
///
/// ## Business Reason
/// Bounds the size of one unit of work so a runaway request cannot hold the
/// write lock for long.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Catches typos such as 10000 instead of 10 at the register.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Prefix for generated product codes (`PROD-0001`, `PROD-0002`, ...).
pub const PRODUCT_CODE_PREFIX: &str = "PROD";
