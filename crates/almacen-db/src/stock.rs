//! # Stock Adjuster
//!
//! Manual stock movements (`ENTRADA`, `SALIDA`, `AJUSTE`), each in its own
//! unit of work:
//!
//! ```text
//! MovementRequest ──► validate ──► begin
//!                                   ├── adjust_stock(product, delta)
//!                                   ├── insert movement (quantity = |delta|)
//!                                   ├── observer ─► alert
//!                                   └── commit
//! ```
//!
//! The non-negativity rule lives in [`LedgerUnit::adjust_stock`]; this
//! module only decides the delta and what gets logged with it.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{notify_observer, LedgerStore, LedgerUnit};
use almacen_core::validation::validate_movement_request;
use almacen_core::{
    Alert, InventoryMovement, LowStockPolicy, MovementRequest, NewMovement, StockLevel,
    StockObserver,
};

/// What a committed manual movement produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementOutcome {
    pub movement: InventoryMovement,
    pub level: StockLevel,
    pub alert: Option<Alert>,
}

/// Applies manual stock movements against a [`LedgerStore`].
pub struct StockAdjuster<S> {
    store: S,
    observer: Option<Arc<dyn StockObserver>>,
}

impl<S: LedgerStore> StockAdjuster<S> {
    pub fn new(store: S) -> Self {
        StockAdjuster {
            store,
            observer: Some(Arc::new(LowStockPolicy)),
        }
    }

    /// Replaces the stock observer. `None` disables alerts.
    pub fn with_observer(mut self, observer: Option<Arc<dyn StockObserver>>) -> Self {
        self.observer = observer;
        self
    }

    /// Adjusts one product's stock by `delta` with no movement attached.
    ///
    /// Leaves no audit trail and fires no observer. Request handlers and
    /// the seeder record stock changes through
    /// [`apply_movement`](Self::apply_movement) instead.
    pub async fn adjust(&self, product_id: i64, delta: i64) -> LedgerResult<StockLevel> {
        let mut unit = self.store.begin().await?;
        let level = unit.adjust_stock(product_id, delta).await?;
        unit.commit().await?;
        Ok(level)
    }

    /// Validates and records a manual movement.
    #[instrument(skip_all, fields(product_id = request.product_id, kind = %request.kind))]
    pub async fn apply_movement(&self, request: MovementRequest) -> LedgerResult<MovementOutcome> {
        let request = validate_movement_request(request).map_err(|e| {
            warn!(error = %e, "Movement rejected by validation");
            LedgerError::from(e)
        })?;
        let delta = request.delta();

        let mut unit = self.store.begin().await?;

        let level = unit.adjust_stock(request.product_id, delta).await?;
        let movement = unit
            .insert_movement(&NewMovement {
                product_id: request.product_id,
                kind: request.kind,
                quantity: delta.saturating_abs(),
                resulting_stock: level.on_hand,
                note: request.note.clone(),
            })
            .await?;
        let alert = notify_observer(&mut unit, self.observer.as_deref(), &level).await?;

        unit.commit().await?;

        info!(
            movement_id = movement.id,
            delta,
            on_hand = level.on_hand,
            "Stock movement recorded"
        );
        Ok(MovementOutcome {
            movement,
            level,
            alert,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::memory::MemoryLedger;
    use almacen_core::{AlertKind, CoreError, MovementKind};

    fn movement(product_id: i64, kind: MovementKind, quantity: i64) -> MovementRequest {
        MovementRequest {
            product_id,
            kind,
            quantity,
            note: Some("recuento".to_string()),
        }
    }

    #[tokio::test]
    async fn test_entrada_adds_stock() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 3, 1).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let outcome = adjuster
            .apply_movement(movement(p, MovementKind::Entrada, 7))
            .await
            .unwrap();

        assert_eq!(outcome.level.on_hand, 10);
        assert_eq!(outcome.movement.quantity, 7);
        assert_eq!(outcome.movement.resulting_stock, 10);
        assert!(outcome.alert.is_none());
    }

    #[tokio::test]
    async fn test_negative_ajuste_logs_absolute_quantity() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 10, 0).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let outcome = adjuster
            .apply_movement(movement(p, MovementKind::Ajuste, -4))
            .await
            .unwrap();

        assert_eq!(outcome.level.on_hand, 6);
        assert_eq!(outcome.movement.kind, MovementKind::Ajuste);
        assert_eq!(outcome.movement.quantity, 4);
    }

    #[tokio::test]
    async fn test_salida_below_zero_rejected_without_movement() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 2, 0).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let err = adjuster
            .apply_movement(movement(p, MovementKind::Salida, 3))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(2));
        assert!(state.movements.is_empty());
    }

    #[tokio::test]
    async fn test_salida_to_zero_raises_critical_alert() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 2, 1).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let outcome = adjuster
            .apply_movement(movement(p, MovementKind::Salida, 2))
            .await
            .unwrap();

        assert_eq!(outcome.alert.map(|a| a.kind), Some(AlertKind::SinStock));
    }

    #[tokio::test]
    async fn test_adjust_zero_returns_current_level() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 4, 1).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let level = adjuster.adjust(p, 0).await.unwrap();
        assert_eq!(level.on_hand, 4);

        assert!(matches!(
            adjuster.adjust(99, 0).await.unwrap_err(),
            LedgerError::Rejected(CoreError::ProductNotFound(99))
        ));
    }

    #[tokio::test]
    async fn test_adjust_records_no_movement_or_alert() {
        let ledger = MemoryLedger::new();
        let p = ledger.add_product("PROD-0001", 2, 1).await;
        let adjuster = StockAdjuster::new(ledger.clone());

        let level = adjuster.adjust(p, -2).await.unwrap();
        assert_eq!(level.on_hand, 0);

        let state = ledger.snapshot().await;
        assert_eq!(state.stock(p), Some(0));
        assert!(state.movements.is_empty());
        assert!(state.alerts.is_empty());
    }
}
