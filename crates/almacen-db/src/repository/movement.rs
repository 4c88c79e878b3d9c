//! # Movement Repository
//!
//! Read side of the append-only inventory movement log.
//!
//! ```text
//! ENTRADA  +q  purchases, returns to stock
//! SALIDA   -q  sales ("Venta #N"), shrinkage
//! AJUSTE   ±d  corrections after a recount
//! ```
//!
//! Movements are appended by the ledger in the same unit of work as the
//! stock change they describe. There is no update or delete.

use sqlx::SqlitePool;

use crate::error::DbResult;
use almacen_core::{InventoryMovement, MovementKind};

pub(crate) const MOVEMENT_COLUMNS: &str =
    "id, product_id, kind, quantity, resulting_stock, note, created_at";

/// Repository for inventory movement queries.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists movements newest first, optionally filtered by kind.
    pub async fn list(&self, kind: Option<MovementKind>, limit: u32) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM inventory_movements
            WHERE ?1 IS NULL OR kind = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2
            "#
        ))
        .bind(kind)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists every movement of one product, newest first.
    pub async fn list_by_product(&self, product_id: i64) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            r#"
            SELECT {MOVEMENT_COLUMNS} FROM inventory_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts movements whose note matches exactly (e.g. `"Venta #12"`).
    pub async fn count_with_note(&self, note: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_movements WHERE note = ?1")
                .bind(note)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
