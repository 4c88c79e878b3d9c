//! # Ledger: Units of Work
//!
//! The seam between the stock/sale logic and the storage engine.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Unit of Work Lifecycle                           │
//! │                                                                         │
//! │  let mut unit = store.begin().await?;      BEGIN                       │
//! │       │                                                                 │
//! │       ├── unit.insert_sale(..)                                         │
//! │       ├── unit.insert_line_item(..)                                    │
//! │       ├── unit.adjust_stock(id, -qty)  ── InsufficientStock? ─┐        │
//! │       ├── unit.insert_movement(..)                             │        │
//! │       ├── unit.insert_alert(..)                                │        │
//! │       │                                                        ▼        │
//! │       ▼                                               `?` returns,     │
//! │  unit.commit().await?;                 COMMIT         unit dropped,    │
//! │                                                       ROLLBACK         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no explicit rollback call. Dropping a unit that was not
//! committed discards every mutation made through it. That covers early
//! returns, panics and cancelled futures (timeouts, client disconnects)
//! with one rule.
//!
//! ## Stock Adjuster Contract
//! [`LedgerUnit::adjust_stock`] is the only way stock changes. It applies a
//! signed delta and never lets a committed `stock_on_hand` go below zero:
//!
//! | delta | outcome |
//! |-------|---------|
//! | `< 0` and `on_hand + delta >= 0` | new level |
//! | `< 0` and `on_hand + delta < 0`  | `InsufficientStock`, nothing changed |
//! | `> 0` | new level, or `StockOverflow` past `i64::MAX` |
//! | `0`   | current level, nothing written |
//! | unknown or inactive product | `ProductNotFound` |

mod sqlite;

#[cfg(test)]
pub(crate) mod memory;

pub use sqlite::{SqliteLedger, SqliteUnit};

use async_trait::async_trait;

use crate::error::{DbResult, LedgerResult};
use almacen_core::{
    Alert, InventoryMovement, NewAlert, NewMovement, Sale, SaleLine, SaleLineItem, StockLevel,
    StockObserver, ValidSale,
};

/// Opens units of work.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    type Unit: LedgerUnit;

    async fn begin(&self) -> DbResult<Self::Unit>;
}

/// A scoped set of mutations that commit or roll back together.
///
/// Dropping without [`commit`](LedgerUnit::commit) rolls back.
#[async_trait]
pub trait LedgerUnit: Send {
    /// Records the sale header.
    async fn insert_sale(&mut self, sale: &ValidSale) -> DbResult<Sale>;

    /// Records one line item. An unknown product is a
    /// `Rejected(ProductNotFound)`, not a persistence failure.
    async fn insert_line_item(&mut self, sale_id: i64, line: &SaleLine)
        -> LedgerResult<SaleLineItem>;

    /// Applies a signed delta to a product's stock. See the module docs.
    async fn adjust_stock(&mut self, product_id: i64, delta: i64) -> LedgerResult<StockLevel>;

    /// Appends a movement to the log.
    async fn insert_movement(&mut self, movement: &NewMovement) -> DbResult<InventoryMovement>;

    /// Records an alert unless an unacknowledged one of the same kind is
    /// already open for the product.
    async fn insert_alert(&mut self, alert: &NewAlert) -> DbResult<Option<Alert>>;

    /// Makes every mutation of this unit durable.
    async fn commit(self) -> DbResult<()>;
}

/// Runs the observer on a fresh stock level and persists what it reports
/// inside the same unit.
pub(crate) async fn notify_observer<U: LedgerUnit>(
    unit: &mut U,
    observer: Option<&dyn StockObserver>,
    level: &StockLevel,
) -> DbResult<Option<Alert>> {
    let Some(new_alert) = observer.and_then(|o| o.on_stock_changed(level)) else {
        return Ok(None);
    };
    unit.insert_alert(&new_alert).await
}
