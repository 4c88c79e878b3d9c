//! # Error Types
//!
//! Domain-specific error types for almacen-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  almacen-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule rejections                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  almacen-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - Rejected | Persistence | TimedOut              │
//! │                                                                         │
//! │  HTTP errors (apps/api)                                                │
//! │  └── ApiError         - status + code + message envelope               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → ApiError → client   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule rejections.
///
/// Every variant is the caller's fault (4xx), never an infrastructure failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product does not exist or has been soft-deleted.
    #[error("Product not found: {0}")]
    ProductNotFound(i64),

    /// A decrement would take stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line (qty: 5)
    ///      │
    ///      ▼
    /// Stock Adjuster: on hand = 2
    ///      │
    ///      ▼
    /// InsufficientStock { code: "PROD-0007", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// Whole sale rolled back, client sees 400
    /// ```
    #[error("Insufficient stock for product {product_id} ({code}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: i64,
        code: String,
        available: i64,
        requested: i64,
    },

    /// A replenishment would overflow the stock counter.
    #[error("Stock for product {product_id} cannot grow by {delta}")]
    StockOverflow { product_id: i64, delta: i64 },

    /// Validation error (wraps ValidationError).
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any mutation happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate product code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Discount larger than the subtotal.
    #[error("discount {discount} exceeds subtotal {subtotal}")]
    NegativeTotal { subtotal: Money, discount: Money },

    /// Tendered amount does not cover the total.
    #[error("amount tendered {tendered} does not cover total {total}")]
    InsufficientTender { total: Money, tendered: Money },

    /// Arithmetic on amounts overflowed.
    #[error("{field} is too large")]
    Overflow { field: String },
}

impl ValidationError {
    /// Creates a Required error for the given field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Creates a MustBePositive error for the given field.
    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
