//! # Stock Alerts
//!
//! Hook invoked after every successful stock adjustment.
//!
//! ```text
//! StockAdjuster ──► StockLevel ──► StockObserver::on_stock_changed
//!                                        │
//!                                        ├── None            → nothing recorded
//!                                        └── Some(NewAlert)  → persisted in the
//!                                                              same unit of work
//! ```
//!
//! The observer only decides. Persisting the alert is the caller's job, so a
//! rolled-back sale never leaves an orphan alert behind.

use crate::types::{AlertKind, AlertSeverity, NewAlert, StockLevel};

/// Reacts to a product's stock after an adjustment.
pub trait StockObserver: Send + Sync {
    fn on_stock_changed(&self, level: &StockLevel) -> Option<NewAlert>;
}

/// Default policy: out of stock is critical, at or below minimum is a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowStockPolicy;

impl StockObserver for LowStockPolicy {
    fn on_stock_changed(&self, level: &StockLevel) -> Option<NewAlert> {
        if level.on_hand == 0 {
            Some(NewAlert {
                product_id: level.product_id,
                kind: AlertKind::SinStock,
                message: format!("Producto {} sin stock", level.code),
                severity: AlertSeverity::Critical,
            })
        } else if level.on_hand <= level.minimum {
            Some(NewAlert {
                product_id: level.product_id,
                kind: AlertKind::StockBajo,
                message: format!(
                    "Stock bajo en {}: {} unidades (mínimo {})",
                    level.code, level.on_hand, level.minimum
                ),
                severity: AlertSeverity::Warning,
            })
        } else {
            None
        }
    }
}
