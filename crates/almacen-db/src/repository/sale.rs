//! # Sale Repository
//!
//! Read side of sales. Sales are written only by the
//! [`SaleCoordinator`](crate::checkout::SaleCoordinator), inside a unit of
//! work, and are immutable afterwards.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use almacen_core::{Sale, SaleLineItem, SaleSummary, SaleWithItems};

pub(crate) const SALE_COLUMNS: &str = "id, operator_id, subtotal_cents, discount_cents, \
     total_cents, payment_method, amount_tendered_cents, created_at";

pub(crate) const SALE_ITEM_COLUMNS: &str =
    "id, sale_id, product_id, quantity, unit_price_cents, line_total_cents";

/// Repository for sale queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Lists sales newest first, each with its number of line items.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<SaleSummary>> {
        let sales = sqlx::query_as::<_, SaleSummary>(
            r#"
            SELECT
                s.id, s.operator_id, s.subtotal_cents, s.discount_cents,
                s.total_cents, s.payment_method, s.amount_tendered_cents, s.created_at,
                (SELECT COUNT(*) FROM sale_items i WHERE i.sale_id = s.id) AS line_count
            FROM sales s
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = sales.len(), "Listed sales");
        Ok(sales)
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all line items of a sale, in the order they were recorded.
    pub async fn get_items(&self, sale_id: i64) -> DbResult<Vec<SaleLineItem>> {
        let items = sqlx::query_as::<_, SaleLineItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY id"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale with its line items.
    pub async fn get_with_items(&self, id: i64) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(id).await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Counts recorded sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
