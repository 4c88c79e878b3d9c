//! # Alert Repository
//!
//! Read and acknowledge stock alerts. Alerts are raised by the ledger when
//! a [`StockObserver`](almacen_core::StockObserver) reports one.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use almacen_core::Alert;

pub(crate) const ALERT_COLUMNS: &str =
    "id, product_id, kind, message, severity, acknowledged, created_at";

/// Repository for alert operations.
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: SqlitePool,
}

impl AlertRepository {
    /// Creates a new AlertRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AlertRepository { pool }
    }

    /// Lists all alerts, newest first.
    pub async fn list(&self) -> DbResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// Lists unacknowledged alerts, most severe first.
    pub async fn list_active(&self) -> DbResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS} FROM alerts
            WHERE acknowledged = 0
            ORDER BY
                CASE severity WHEN 'critical' THEN 0 WHEN 'warning' THEN 1 ELSE 2 END,
                created_at DESC, id DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// Lists every alert of one product, newest first.
    pub async fn list_by_product(&self, product_id: i64) -> DbResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE product_id = ?1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(alerts)
    }

    /// Marks an alert as attended.
    ///
    /// Acknowledging twice is not an error.
    pub async fn acknowledge(&self, id: i64) -> DbResult<Alert> {
        debug!(id = id, "Acknowledging alert");

        sqlx::query_as::<_, Alert>(&format!(
            "UPDATE alerts SET acknowledged = 1 WHERE id = ?1 RETURNING {ALERT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Alert", id))
    }
}
