//! # Repository Module
//!
//! Database repository implementations for Almacén POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories vs. Ledger                              │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       ├── reads, catalogue edits ──► Repositories (one statement each) │
//! │       │                              ProductRepository                 │
//! │       │                              SaleRepository                    │
//! │       │                              MovementRepository                │
//! │       │                              AlertRepository                   │
//! │       │                              ConfigRepository                  │
//! │       │                                                                 │
//! │       └── stock changes ───────────► Ledger (unit of work)             │
//! │                                      SaleCoordinator, StockAdjuster    │
//! │                                                                         │
//! │  Anything that touches stock_on_hand goes through the ledger so the    │
//! │  stock change, its movement and any alert commit together.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD
//! - [`SaleRepository`](sale::SaleRepository) - Sale listing and detail
//! - [`MovementRepository`](movement::MovementRepository) - Movement log
//! - [`AlertRepository`](alert::AlertRepository) - Alert listing and acknowledgement
//! - [`ConfigRepository`](config::ConfigRepository) - Key-value system settings

pub mod alert;
pub mod config;
pub mod movement;
pub mod product;
pub mod sale;
