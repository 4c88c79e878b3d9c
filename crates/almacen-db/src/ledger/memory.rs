//! In-memory ledger for coordinator tests.
//!
//! A unit holds the store's lock for its whole lifetime and works on a
//! staged copy. `commit` writes the copy back; dropping the unit discards it.
//! Failure points and delays can be injected to exercise rollback paths.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{LedgerStore, LedgerUnit};
use crate::error::{DbError, DbResult, LedgerResult};
use almacen_core::{
    Alert, CoreError, InventoryMovement, NewAlert, NewMovement, Sale, SaleLine, SaleLineItem,
    StockLevel, ValidSale,
};

#[derive(Debug, Clone)]
pub struct MemoryProduct {
    pub id: i64,
    pub code: String,
    pub on_hand: i64,
    pub minimum: i64,
    pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub products: Vec<MemoryProduct>,
    pub sales: Vec<Sale>,
    pub items: Vec<SaleLineItem>,
    pub movements: Vec<InventoryMovement>,
    pub alerts: Vec<Alert>,
    /// Fail the n-th (0-based) movement insert of a unit.
    pub fail_movement_at: Option<usize>,
    /// Sleep inside every stock adjustment.
    pub adjust_delay: Option<Duration>,
    /// Sleep before a commit writes the staged copy back.
    pub commit_delay: Option<Duration>,
}

impl MemoryState {
    fn next_id(len: usize) -> i64 {
        len as i64 + 1
    }

    pub fn stock(&self, product_id: i64) -> Option<i64> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .map(|p| p.on_hand)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_product(&self, code: &str, on_hand: i64, minimum: i64) -> i64 {
        let mut state = self.state.lock().await;
        let id = MemoryState::next_id(state.products.len());
        state.products.push(MemoryProduct {
            id,
            code: code.to_string(),
            on_hand,
            minimum,
            active: true,
        });
        id
    }

    pub async fn configure(&self, f: impl FnOnce(&mut MemoryState)) {
        f(&mut *self.state.lock().await);
    }

    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    type Unit = MemoryUnit;

    async fn begin(&self) -> DbResult<MemoryUnit> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(MemoryUnit {
            guard,
            staged,
            movements_in_unit: 0,
        })
    }
}

pub struct MemoryUnit {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
    movements_in_unit: usize,
}

#[async_trait]
impl LedgerUnit for MemoryUnit {
    async fn insert_sale(&mut self, sale: &ValidSale) -> DbResult<Sale> {
        let row = Sale {
            id: MemoryState::next_id(self.staged.sales.len()),
            operator_id: sale.operator_id,
            subtotal_cents: sale.totals.subtotal.cents(),
            discount_cents: sale.totals.discount.cents(),
            total_cents: sale.totals.total.cents(),
            payment_method: sale.payment_method,
            amount_tendered_cents: sale.totals.tendered.cents(),
            created_at: Utc::now(),
        };
        self.staged.sales.push(row.clone());
        Ok(row)
    }

    async fn insert_line_item(
        &mut self,
        sale_id: i64,
        line: &SaleLine,
    ) -> LedgerResult<SaleLineItem> {
        if !self.staged.products.iter().any(|p| p.id == line.product_id) {
            return Err(CoreError::ProductNotFound(line.product_id).into());
        }
        let item = SaleLineItem {
            id: MemoryState::next_id(self.staged.items.len()),
            sale_id,
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total.cents(),
        };
        self.staged.items.push(item.clone());
        Ok(item)
    }

    async fn adjust_stock(&mut self, product_id: i64, delta: i64) -> LedgerResult<StockLevel> {
        if let Some(delay) = self.staged.adjust_delay {
            tokio::time::sleep(delay).await;
        }

        let product = self
            .staged
            .products
            .iter_mut()
            .find(|p| p.id == product_id && p.active)
            .ok_or(CoreError::ProductNotFound(product_id))?;

        let new_stock = product
            .on_hand
            .checked_add(delta)
            .ok_or(CoreError::StockOverflow { product_id, delta })?;
        if new_stock < 0 {
            return Err(CoreError::InsufficientStock {
                product_id,
                code: product.code.clone(),
                available: product.on_hand,
                requested: delta.saturating_neg(),
            }
            .into());
        }

        product.on_hand = new_stock;
        Ok(StockLevel {
            product_id,
            code: product.code.clone(),
            on_hand: product.on_hand,
            minimum: product.minimum,
        })
    }

    async fn insert_movement(&mut self, movement: &NewMovement) -> DbResult<InventoryMovement> {
        if self.staged.fail_movement_at == Some(self.movements_in_unit) {
            return Err(DbError::QueryFailed("injected movement failure".to_string()));
        }
        self.movements_in_unit += 1;

        let row = InventoryMovement {
            id: MemoryState::next_id(self.staged.movements.len()),
            product_id: movement.product_id,
            kind: movement.kind,
            quantity: movement.quantity,
            resulting_stock: movement.resulting_stock,
            note: movement.note.clone(),
            created_at: Utc::now(),
        };
        self.staged.movements.push(row.clone());
        Ok(row)
    }

    async fn insert_alert(&mut self, alert: &NewAlert) -> DbResult<Option<Alert>> {
        let already_open = self
            .staged
            .alerts
            .iter()
            .any(|a| a.product_id == alert.product_id && a.kind == alert.kind && !a.acknowledged);
        if already_open {
            return Ok(None);
        }

        let row = Alert {
            id: MemoryState::next_id(self.staged.alerts.len()),
            product_id: alert.product_id,
            kind: alert.kind,
            message: alert.message.clone(),
            severity: alert.severity,
            acknowledged: false,
            created_at: Utc::now(),
        };
        self.staged.alerts.push(row.clone());
        Ok(Some(row))
    }

    async fn commit(mut self) -> DbResult<()> {
        if let Some(delay) = self.staged.commit_delay {
            tokio::time::sleep(delay).await;
        }
        *self.guard = self.staged;
        Ok(())
    }
}
