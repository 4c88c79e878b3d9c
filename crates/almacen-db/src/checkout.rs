//! # Sale Transaction Coordinator
//!
//! Turns a sale request into committed rows, or into nothing at all.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       create_sale(request)                              │
//! │                                                                         │
//! │  1. validate_sale_request ──── ValidationError? ──► Rejected (no I/O)  │
//! │     (totals, change, payment method computed here)                      │
//! │       │                                                                 │
//! │       ▼                                    ┐                            │
//! │  2. begin unit                             │                            │
//! │  3. insert sale                            │  under SALE_TIMEOUT        │
//! │  4. for each line, in input order:         │                            │
//! │       insert line item                     │  any error ─► unit dropped │
//! │       adjust_stock(product, -quantity)     │             ─► ROLLBACK    │
//! │       insert SALIDA movement "Venta #id"   │                            │
//! │       observer ─► alert (same unit)        ┘                            │
//! │  5. commit (no deadline)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SaleReceipt { id, subtotal, discount, total, tendered, change }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The deadline covers steps 2-4 only. Once `commit` has been issued the
//! outcome is whatever the store reports, so `TimedOut` always means nothing
//! was written.
//!
//! Two lines for the same product are applied one after the other, each
//! with its own adjustment and movement.
//!
//! Concurrent coordinators share nothing in process. Two sales racing for
//! the last units meet at the conditional UPDATE in
//! [`LedgerUnit::adjust_stock`]; the second one sees the first one's
//! committed stock and is rejected with `InsufficientStock`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{notify_observer, LedgerStore, LedgerUnit};
use almacen_core::validation::validate_sale_request;
use almacen_core::{
    LowStockPolicy, MovementKind, NewMovement, SaleReceipt, SaleRequest, StockObserver, ValidSale,
};

/// Default deadline for one sale's unit of work.
pub const DEFAULT_SALE_TIMEOUT: Duration = Duration::from_secs(5);

/// Note written on every movement a sale produces.
pub fn sale_movement_note(sale_id: i64) -> String {
    format!("Venta #{sale_id}")
}

/// Records sales atomically against a [`LedgerStore`].
pub struct SaleCoordinator<S> {
    store: S,
    observer: Option<Arc<dyn StockObserver>>,
    timeout: Duration,
}

impl<S: LedgerStore> SaleCoordinator<S> {
    /// Creates a coordinator with the low-stock policy and the default timeout.
    pub fn new(store: S) -> Self {
        SaleCoordinator {
            store,
            observer: Some(Arc::new(LowStockPolicy)),
            timeout: DEFAULT_SALE_TIMEOUT,
        }
    }

    /// Replaces the stock observer. `None` disables alerts.
    pub fn with_observer(mut self, observer: Option<Arc<dyn StockObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Sets the deadline for the work done before commit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validates and records a sale.
    ///
    /// ## Errors
    /// * `Rejected(Validation(..))` - bad input, nothing was opened
    /// * `Rejected(InsufficientStock { .. })` - names the first short product
    /// * `Rejected(ProductNotFound(id))` - unknown or inactive product
    /// * `Persistence(..)` - storage failure
    /// * `TimedOut(..)` - deadline passed before commit, the unit was rolled back
    ///
    /// In every error case no row of the sale remains. A commit that
    /// outlasts the deadline is still reported as committed.
    #[instrument(
        skip_all,
        fields(operator_id = ?request.operator_id, lines = request.lines.len())
    )]
    pub async fn create_sale(&self, request: &SaleRequest) -> LedgerResult<SaleReceipt> {
        let sale = validate_sale_request(request).map_err(|e| {
            warn!(error = %e, "Sale rejected by validation");
            LedgerError::from(e)
        })?;

        let outcome = self.record(&sale).await;

        match &outcome {
            Ok(receipt) => info!(
                sale_id = receipt.sale_id,
                total = %receipt.total,
                payment_method = %receipt.payment_method,
                "Sale committed"
            ),
            Err(LedgerError::Persistence(e)) => {
                tracing::error!(error = %e, "Sale rolled back on storage failure")
            }
            Err(e) => warn!(error = %e, "Sale rolled back"),
        }

        outcome
    }

    async fn record(&self, sale: &ValidSale) -> LedgerResult<SaleReceipt> {
        // On expiry the in-flight future is dropped, which drops the unit.
        let (unit, receipt) = match tokio::time::timeout(self.timeout, self.stage(sale)).await {
            Ok(staged) => staged?,
            Err(_) => return Err(LedgerError::TimedOut(self.timeout)),
        };

        unit.commit().await?;
        Ok(receipt)
    }

    /// Writes every row of the sale into an open unit, leaving the commit
    /// to the caller.
    async fn stage(&self, sale: &ValidSale) -> LedgerResult<(S::Unit, SaleReceipt)> {
        let mut unit = self.store.begin().await?;

        let row = unit.insert_sale(sale).await?;
        let note = sale_movement_note(row.id);

        for line in &sale.lines {
            unit.insert_line_item(row.id, line).await?;

            let level = unit.adjust_stock(line.product_id, -line.quantity).await?;

            unit.insert_movement(&NewMovement {
                product_id: line.product_id,
                kind: MovementKind::Salida,
                quantity: line.quantity,
                resulting_stock: level.on_hand,
                note: Some(note.clone()),
            })
            .await?;

            notify_observer(&mut unit, self.observer.as_deref(), &level).await?;
        }

        let receipt = SaleReceipt {
            sale_id: row.id,
            subtotal: sale.totals.subtotal,
            discount: sale.totals.discount,
            total: sale.totals.total,
            amount_tendered: sale.totals.tendered,
            change: sale.totals.change,
            payment_method: sale.payment_method,
            created_at: row.created_at,
        };

        Ok((unit, receipt))
    }
}

// =============================================================================
// Unit Tests (in-memory ledger)
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;
    use almacen_core::{AlertKind, CoreError, LineItemRequest, Money, ValidationError};

    fn line(product_id: i64, quantity: i64, price_cents: i64) -> LineItemRequest {
        LineItemRequest {
            product_id: Some(product_id),
            quantity,
            unit_price: Money::from_cents(price_cents),
        }
    }

    fn request(lines: Vec<LineItemRequest>) -> SaleRequest {
        SaleRequest {
            operator_id: Some(1),
            lines,
            payment_method: Some("efectivo".to_string()),
            discount: None,
            amount_tendered: None,
        }
    }

    #[tokio::test]
    async fn test_scenario_a_single_line_sale() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 10, 2).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        let mut req = request(vec![line(p, 3, 10_000)]);
        req.amount_tendered = Some(Money::from_cents(30_000));
        let receipt = coordinator.create_sale(&req).await.unwrap();

        assert_eq!(receipt.total, Money::from_cents(30_000));
        assert!(receipt.change.is_zero());

        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(7));
        assert_eq!(state.movements.len(), 1);
        assert_eq!(state.movements[0].kind, MovementKind::Salida);
        assert_eq!(state.movements[0].quantity, 3);
        assert_eq!(state.movements[0].resulting_stock, 7);
        assert_eq!(
            state.movements[0].note.as_deref(),
            Some(sale_movement_note(receipt.sale_id).as_str())
        );
        assert!(state.alerts.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_b_insufficient_stock_leaves_nothing() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 2, 0).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        let err = coordinator
            .create_sale(&request(vec![line(p, 5, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { product_id, available: 2, requested: 5, .. })
                if product_id == p
        ));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(2));
        assert!(state.sales.is_empty());
        assert!(state.items.is_empty());
        assert!(state.movements.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_c_second_line_short_rolls_back_first() {
        let ledger = MemoryLedger::new();
        let p1 = ledger.add_product("PROD-0001", 10, 0).await;
        let p2 = ledger.add_product("PROD-0002", 1, 0).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        let err = coordinator
            .create_sale(&request(vec![line(p1, 4, 100), line(p2, 2, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { product_id, .. }) if product_id == p2
        ));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p1), Some(10));
        assert_eq!(state.stock(p2), Some(1));
        assert!(state.sales.is_empty());
        assert!(state.movements.is_empty());
    }

    #[tokio::test]
    async fn test_scenario_d_discount_and_tender() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 10, 0).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        let mut req = request(vec![line(p, 3, 10_000)]);
        req.discount = Some(Money::from_cents(5_000));
        req.amount_tendered = Some(Money::from_cents(25_000));
        let receipt = coordinator.create_sale(&req).await.unwrap();
        assert_eq!(receipt.total, Money::from_cents(25_000));
        assert!(receipt.change.is_zero());

        req.amount_tendered = Some(Money::from_cents(20_000));
        let err = coordinator.create_sale(&req).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::Validation(ValidationError::InsufficientTender { .. }))
        ));

        // Only the first sale touched stock.
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(7));
        assert_eq!(state.sales.len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_mid_sale_rolls_back() {
        let ledger = MemoryLedger::new();
        let p1 = ledger.add_product("PROD-0001", 10, 0).await;
        let p2 = ledger.add_product("PROD-0002", 10, 0).await;
        ledger.configure(|s| s.fail_movement_at = Some(1)).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        let err = coordinator
            .create_sale(&request(vec![line(p1, 1, 100), line(p2, 1, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Persistence(_)));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p1), Some(10));
        assert_eq!(state.stock(p2), Some(10));
        assert!(state.sales.is_empty());
        assert!(state.items.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_rolls_back() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 10, 0).await;
        ledger
            .configure(|s| s.adjust_delay = Some(Duration::from_millis(200)))
            .await;
        let coordinator =
            SaleCoordinator::new(ledger.clone()).with_timeout(Duration::from_millis(20));

        let err = coordinator
            .create_sale(&request(vec![line(p, 1, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::TimedOut(_)));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(10));
        assert!(state.sales.is_empty());
    }

    #[tokio::test]
    async fn test_slow_commit_is_not_reported_as_timeout() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 10, 0).await;
        ledger
            .configure(|s| s.commit_delay = Some(Duration::from_millis(100)))
            .await;
        let coordinator =
            SaleCoordinator::new(ledger.clone()).with_timeout(Duration::from_millis(20));

        let receipt = coordinator
            .create_sale(&request(vec![line(p, 4, 100)]))
            .await
            .unwrap();

        assert_eq!(receipt.total, Money::from_cents(400));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(6));
        assert_eq!(state.sales.len(), 1);
        assert_eq!(state.sales[0].id, receipt.sale_id);
    }

    #[tokio::test]
    async fn test_duplicate_product_lines_apply_independently() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 5, 0).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        coordinator
            .create_sale(&request(vec![line(p, 2, 100), line(p, 3, 100)]))
            .await
            .unwrap();

        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(0));
        let resulting: Vec<i64> = state.movements.iter().map(|m| m.resulting_stock).collect();
        assert_eq!(resulting, vec![3, 0]);

        // A third unit of the same product in two lines is one too many.
        let err = coordinator
            .create_sale(&request(vec![line(p, 1, 100)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_product_is_rejected() {
        let ledger = MemoryLedger::new();
        let coordinator = SaleCoordinator::new(ledger.clone());

        let err = coordinator
            .create_sale(&request(vec![line(42, 1, 100)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::ProductNotFound(42))
        ));
        assert!(ledger.snapshot().await.sales.is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_alert_raised_once() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 6, 5).await;
        let coordinator = SaleCoordinator::new(ledger.clone());

        coordinator
            .create_sale(&request(vec![line(p, 1, 100)]))
            .await
            .unwrap();
        coordinator
            .create_sale(&request(vec![line(p, 1, 100)]))
            .await
            .unwrap();

        let state = ledger.snapshot().await;
        assert_eq!(state.alerts.len(), 1);
        assert_eq!(state.alerts[0].kind, AlertKind::StockBajo);
    }

    #[tokio::test]
    async fn test_alerts_can_be_disabled() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 1, 5).await;
        let coordinator = SaleCoordinator::new(ledger.clone()).with_observer(None);

        coordinator
            .create_sale(&request(vec![line(p, 1, 100)]))
            .await
            .unwrap();

        assert!(ledger.snapshot().await.alerts.is_empty());
    }
}

// =============================================================================
// Integration Tests (SQLite)
// =============================================================================

#[cfg(test)]
mod sqlite_tests {
    use super::*;
    use crate::{Database, DbConfig};
    use almacen_core::{AlertKind, CoreError, LineItemRequest, Money, NewProduct};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, stock: i64, minimum: i64) -> i64 {
        db.products()
            .create(NewProduct {
                name: format!("Producto {stock}/{minimum}"),
                price: Money::from_cents(10_000),
                stock_on_hand: stock,
                stock_minimum: minimum,
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }

    fn sale(lines: &[(i64, i64)]) -> SaleRequest {
        SaleRequest {
            operator_id: Some(1),
            lines: lines
                .iter()
                .map(|&(product_id, quantity)| LineItemRequest {
                    product_id: Some(product_id),
                    quantity,
                    unit_price: Money::from_cents(10_000),
                })
                .collect(),
            payment_method: Some("tarjeta".to_string()),
            discount: None,
            amount_tendered: None,
        }
    }

    async fn stock(db: &Database, id: i64) -> i64 {
        db.products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .stock_on_hand
    }

    #[tokio::test]
    async fn test_committed_sale_is_readable() {
        let db = setup().await;
        let p = product(&db, 10, 2).await;
        let coordinator = SaleCoordinator::new(db.ledger());

        let receipt = coordinator.create_sale(&sale(&[(p, 3)])).await.unwrap();

        assert_eq!(stock(&db, p).await, 7);

        let stored = db.sales().get_with_items(receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(stored.sale.total(), Money::from_cents(30_000));
        assert_eq!(stored.sale.payment_method, almacen_core::PaymentMethod::Tarjeta);
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].quantity, 3);

        let movements = db.movements().list_by_product(p).await.unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, MovementKind::Salida);
        assert_eq!(movements[0].resulting_stock, 7);
        assert_eq!(
            movements[0].note.as_deref(),
            Some(sale_movement_note(receipt.sale_id).as_str())
        );

        let listed = db.sales().list(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].line_count, 1);
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_no_rows() {
        let db = setup().await;
        let p1 = product(&db, 10, 0).await;
        let p2 = product(&db, 1, 0).await;
        let coordinator = SaleCoordinator::new(db.ledger());

        let err = coordinator
            .create_sale(&sale(&[(p1, 4), (p2, 2)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { product_id, available: 1, requested: 2, .. })
                if product_id == p2
        ));
        assert_eq!(stock(&db, p1).await, 10);
        assert_eq!(stock(&db, p2).await, 1);
        assert_eq!(db.sales().count().await.unwrap(), 0);
        assert!(db.movements().list(None, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_and_inactive_products_are_not_found() {
        let db = setup().await;
        let p = product(&db, 10, 0).await;
        db.products().soft_delete(p).await.unwrap();
        let coordinator = SaleCoordinator::new(db.ledger());

        let unknown = coordinator.create_sale(&sale(&[(999, 1)])).await.unwrap_err();
        assert!(matches!(
            unknown,
            LedgerError::Rejected(CoreError::ProductNotFound(999))
        ));

        let inactive = coordinator.create_sale(&sale(&[(p, 1)])).await.unwrap_err();
        assert!(matches!(
            inactive,
            LedgerError::Rejected(CoreError::ProductNotFound(id)) if id == p
        ));
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_low_stock_alert_commits_with_sale() {
        let db = setup().await;
        let p = product(&db, 3, 2).await;
        let coordinator = SaleCoordinator::new(db.ledger());

        coordinator.create_sale(&sale(&[(p, 1)])).await.unwrap();
        coordinator.create_sale(&sale(&[(p, 2)])).await.unwrap();

        let alerts = db.alerts().list_by_product(p).await.unwrap();
        let kinds: Vec<AlertKind> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::SinStock, AlertKind::StockBajo]);

        // Active list puts the critical one first.
        let active = db.alerts().list_active().await.unwrap();
        assert_eq!(active[0].kind, AlertKind::SinStock);

        let acked = db.alerts().acknowledge(active[0].id).await.unwrap();
        assert!(acked.acknowledged);
        assert_eq!(db.alerts().list_active().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_sale_leaves_no_alert() {
        let db = setup().await;
        let p1 = product(&db, 1, 5).await;
        let p2 = product(&db, 0, 0).await;
        let coordinator = SaleCoordinator::new(db.ledger());

        // First line would raise an alert; second line fails.
        coordinator
            .create_sale(&sale(&[(p1, 1), (p2, 1)]))
            .await
            .unwrap_err();

        assert!(db.alerts().list().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("almacen.db")).max_connections(8))
            .await
            .unwrap();
        let p = product(&db, 20, 0).await;
        let coordinator = Arc::new(SaleCoordinator::new(db.ledger()));

        let mut handles = Vec::new();
        for _ in 0..30 {
            let coordinator = coordinator.clone();
            handles.push(tokio::spawn(async move {
                coordinator.create_sale(&sale(&[(p, 1)])).await
            }));
        }

        let mut committed = 0;
        let mut rejected = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => committed += 1,
                Err(LedgerError::Rejected(CoreError::InsufficientStock { .. })) => rejected += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(committed, 20);
        assert_eq!(rejected, 10);
        assert_eq!(stock(&db, p).await, 0);
        assert_eq!(db.sales().count().await.unwrap(), 20);
        assert_eq!(db.movements().list_by_product(p).await.unwrap().len(), 20);
        db.close().await;
    }
}
