//! Shared application state.

use std::sync::Arc;

use almacen_core::{LowStockPolicy, StockObserver};
use almacen_db::{Database, SaleCoordinator, SqliteLedger, StockAdjuster};

use crate::config::ApiConfig;

/// Handed to every handler through axum's `State` extractor.
///
/// Cloning is cheap: the pool and both coordinators are shared.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sales: Arc<SaleCoordinator<SqliteLedger>>,
    pub stock: Arc<StockAdjuster<SqliteLedger>>,
}

impl AppState {
    pub fn new(db: Database, config: &ApiConfig) -> Self {
        let observer: Option<Arc<dyn StockObserver>> = if config.alerts_enabled {
            Some(Arc::new(LowStockPolicy))
        } else {
            None
        };

        let sales = SaleCoordinator::new(db.ledger())
            .with_observer(observer.clone())
            .with_timeout(config.sale_timeout());
        let stock = StockAdjuster::new(db.ledger()).with_observer(observer);

        AppState {
            db,
            sales: Arc::new(sales),
            stock: Arc::new(stock),
        }
    }
}
