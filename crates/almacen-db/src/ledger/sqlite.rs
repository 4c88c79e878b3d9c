//! SQLite-backed ledger. One unit of work is one sqlx transaction.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use super::{LedgerStore, LedgerUnit};
use crate::error::{DbError, DbResult, LedgerResult};
use crate::repository::alert::ALERT_COLUMNS;
use crate::repository::movement::MOVEMENT_COLUMNS;
use crate::repository::sale::{SALE_COLUMNS, SALE_ITEM_COLUMNS};
use almacen_core::{
    Alert, CoreError, InventoryMovement, NewAlert, NewMovement, Sale, SaleLine, SaleLineItem,
    StockLevel, ValidSale,
};

/// Opens transactions on a shared pool.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteLedger { pool }
    }
}

#[async_trait]
impl LedgerStore for SqliteLedger {
    type Unit = SqliteUnit;

    async fn begin(&self) -> DbResult<SqliteUnit> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(SqliteUnit { tx })
    }
}

/// An open transaction. Rolls back on drop unless committed.
pub struct SqliteUnit {
    tx: Transaction<'static, Sqlite>,
}

impl SqliteUnit {
    async fn current_level(&mut self, product_id: i64) -> DbResult<Option<StockLevel>> {
        let level = sqlx::query_as::<_, StockLevel>(
            r#"
            SELECT id AS product_id, code, stock_on_hand AS on_hand, stock_minimum AS minimum
            FROM products
            WHERE id = ?1 AND is_active = 1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(level)
    }
}

#[async_trait]
impl LedgerUnit for SqliteUnit {
    async fn insert_sale(&mut self, sale: &ValidSale) -> DbResult<Sale> {
        let totals = &sale.totals;

        let row = sqlx::query_as::<_, Sale>(&format!(
            r#"
            INSERT INTO sales (
                operator_id, subtotal_cents, discount_cents, total_cents,
                payment_method, amount_tendered_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING {SALE_COLUMNS}
            "#
        ))
        .bind(sale.operator_id)
        .bind(totals.subtotal.cents())
        .bind(totals.discount.cents())
        .bind(totals.total.cents())
        .bind(sale.payment_method)
        .bind(totals.tendered.cents())
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        debug!(sale_id = row.id, total = %totals.total, "Inserted sale");
        Ok(row)
    }

    async fn insert_line_item(
        &mut self,
        sale_id: i64,
        line: &SaleLine,
    ) -> LedgerResult<SaleLineItem> {
        let result = sqlx::query_as::<_, SaleLineItem>(&format!(
            r#"
            INSERT INTO sale_items (
                sale_id, product_id, quantity, unit_price_cents, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING {SALE_ITEM_COLUMNS}
            "#
        ))
        .bind(sale_id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.line_total.cents())
        .fetch_one(&mut *self.tx)
        .await;

        match result.map_err(DbError::from) {
            Ok(item) => Ok(item),
            Err(DbError::ForeignKeyViolation { .. }) => {
                Err(CoreError::ProductNotFound(line.product_id).into())
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn adjust_stock(&mut self, product_id: i64, delta: i64) -> LedgerResult<StockLevel> {
        if delta == 0 {
            return self
                .current_level(product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(product_id).into());
        }

        // Check and write in one statement: no window between reading the
        // stock and decrementing it. The CASE keeps the guard expression
        // itself from overflowing.
        let updated = sqlx::query_as::<_, StockLevel>(
            r#"
            UPDATE products
            SET stock_on_hand = stock_on_hand + ?2,
                updated_at = ?3
            WHERE id = ?1
              AND is_active = 1
              AND CASE WHEN ?2 > 0
                       THEN stock_on_hand <= 9223372036854775807 - ?2
                       ELSE stock_on_hand + ?2 >= 0
                  END
            RETURNING id AS product_id, code, stock_on_hand AS on_hand, stock_minimum AS minimum
            "#,
        )
        .bind(product_id)
        .bind(delta)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(level) = updated {
            debug!(product_id, delta, on_hand = level.on_hand, "Adjusted stock");
            return Ok(level);
        }

        // Nothing matched: find out why.
        let rejection = match self.current_level(product_id).await? {
            None => CoreError::ProductNotFound(product_id),
            Some(level) if delta < 0 => CoreError::InsufficientStock {
                product_id,
                code: level.code,
                available: level.on_hand,
                requested: delta.saturating_neg(),
            },
            Some(_) => CoreError::StockOverflow { product_id, delta },
        };

        warn!(product_id, delta, reason = %rejection, "Stock adjustment rejected");
        Err(rejection.into())
    }

    async fn insert_movement(&mut self, movement: &NewMovement) -> DbResult<InventoryMovement> {
        let row = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            INSERT INTO inventory_movements (
                product_id, kind, quantity, resulting_stock, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING {MOVEMENT_COLUMNS}
            "#
        ))
        .bind(movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.resulting_stock)
        .bind(&movement.note)
        .bind(Utc::now())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_alert(&mut self, alert: &NewAlert) -> DbResult<Option<Alert>> {
        let row = sqlx::query_as::<_, Alert>(&format!(
            r#"
            INSERT INTO alerts (product_id, kind, message, severity, acknowledged, created_at)
            SELECT ?1, ?2, ?3, ?4, 0, ?5
            WHERE NOT EXISTS (
                SELECT 1 FROM alerts
                WHERE product_id = ?1 AND kind = ?2 AND acknowledged = 0
            )
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(alert.product_id)
        .bind(alert.kind)
        .bind(&alert.message)
        .bind(alert.severity)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;

        if let Some(alert) = &row {
            debug!(alert_id = alert.id, product_id = alert.product_id, "Raised stock alert");
        }
        Ok(row)
    }

    async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use crate::{Database, DbConfig};
    use almacen_core::{Money, NewProduct};

    async fn setup(stock: i64) -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .products()
            .create(NewProduct {
                name: "Arroz 1kg".to_string(),
                price: Money::from_cents(1_500),
                stock_on_hand: stock,
                stock_minimum: 1,
                ..Default::default()
            })
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_decrement_to_exactly_zero() {
        let (db, id) = setup(5).await;
        let mut unit = db.ledger().begin().await.unwrap();

        let level = unit.adjust_stock(id, -5).await.unwrap();
        assert_eq!(level.on_hand, 0);
        assert_eq!(level.minimum, 1);
        unit.commit().await.unwrap();

        let product = db.products().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(product.stock_on_hand, 0);
    }

    #[tokio::test]
    async fn test_decrement_below_zero_changes_nothing() {
        let (db, id) = setup(2).await;
        let mut unit = db.ledger().begin().await.unwrap();

        let err = unit.adjust_stock(id, -3).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // The same unit still sees the untouched level.
        assert_eq!(unit.adjust_stock(id, 0).await.unwrap().on_hand, 2);
    }

    #[tokio::test]
    async fn test_increment_overflow_rejected() {
        let (db, id) = setup(10).await;
        let mut unit = db.ledger().begin().await.unwrap();

        let err = unit.adjust_stock(id, i64::MAX).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Rejected(CoreError::StockOverflow { delta: i64::MAX, .. })
        ));

        let level = unit.adjust_stock(id, i64::MAX - 10).await.unwrap();
        assert_eq!(level.on_hand, i64::MAX);
    }

    #[tokio::test]
    async fn test_dropped_unit_rolls_back() {
        let (db, id) = setup(10).await;

        {
            let mut unit = db.ledger().begin().await.unwrap();
            unit.adjust_stock(id, -4).await.unwrap();
            // dropped without commit
        }

        let product = db.products().get_by_id(id).await.unwrap().unwrap();
        assert_eq!(product.stock_on_hand, 10);
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let (db, _) = setup(1).await;
        let mut unit = db.ledger().begin().await.unwrap();

        for delta in [-1, 0, 1] {
            let err = unit.adjust_stock(777, delta).await.unwrap_err();
            assert!(matches!(
                err,
                LedgerError::Rejected(CoreError::ProductNotFound(777))
            ));
        }
    }
}
