//! # almacen-db: Database Layer for Almacén POS
//!
//! SQLite storage, repositories and the transactional sale/stock logic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Almacén POS Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /ventas)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     almacen-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ SaleCoordinator│   │  StockAdjuster │    │ Repositories │  │   │
//! │  │   │ (checkout.rs) │    │  (stock.rs)   │    │ (reads, CRUD)│  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────┬───────┘  │   │
//! │  │           └──────────┬─────────┘                   │          │   │
//! │  │                      ▼                             │          │   │
//! │  │           ┌─────────────────────┐                  │          │   │
//! │  │           │ Ledger (unit of work)│                 │          │   │
//! │  │           │ SqliteLedger / Unit │                  │          │   │
//! │  │           └──────────┬──────────┘                  │          │   │
//! │  │                      ▼                             ▼          │   │
//! │  │   ┌─────────────────────────────────────────────────────────┐ │   │
//! │  │   │  Database (pool.rs): SqlitePool, WAL, migrations        │ │   │
//! │  │   └─────────────────────────────────────────────────────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `LedgerError`
//! - [`repository`] - Repositories (product, sale, movement, alert, config)
//! - [`ledger`] - `LedgerStore` / `LedgerUnit` seam and its SQLite implementation
//! - [`checkout`] - Sale Transaction Coordinator
//! - [`stock`] - Manual stock movements
//!
//! ## Usage
//!
//! ```rust,ignore
//! use almacen_db::{Database, DbConfig, SaleCoordinator};
//!
//! let db = Database::new(DbConfig::new("./data/almacen.db")).await?;
//! let coordinator = SaleCoordinator::new(db.ledger());
//!
//! let receipt = coordinator.create_sale(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod stock;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{SaleCoordinator, DEFAULT_SALE_TIMEOUT};
pub use error::{DbError, DbResult, LedgerError, LedgerResult};
pub use ledger::{LedgerStore, LedgerUnit, SqliteLedger, SqliteUnit};
pub use pool::{Database, DbConfig};
pub use stock::{MovementOutcome, StockAdjuster};

// Repository re-exports for convenience
pub use repository::alert::AlertRepository;
pub use repository::config::ConfigRepository;
pub use repository::movement::MovementRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
