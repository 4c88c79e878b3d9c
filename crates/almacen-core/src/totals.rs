//! # Sale Totals
//!
//! Computes everything the register needs to know about a sale before any
//! stock is touched.
//!
//! ```text
//! subtotal = Σ (quantity × unit_price)
//! total    = subtotal − discount          (rejected if < 0)
//! tendered = amount_tendered or total
//! change   = tendered − total             (rejected if < 0)
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

/// The computed amounts of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    pub tendered: Money,
    pub change: Money,
}

impl SaleTotals {
    /// Computes totals from `(quantity, unit_price)` pairs.
    ///
    /// Inputs are assumed already range-checked (positive quantities,
    /// non-negative prices and discount). Only arithmetic overflow and the
    /// two monetary laws are enforced here.
    pub fn compute<I>(
        lines: I,
        discount: Money,
        tendered: Option<Money>,
    ) -> Result<SaleTotals, ValidationError>
    where
        I: IntoIterator<Item = (i64, Money)>,
    {
        let mut subtotal = Money::zero();
        for (quantity, unit_price) in lines {
            let line_total = unit_price
                .checked_mul_quantity(quantity)
                .ok_or_else(|| overflow("subtotal"))?;
            subtotal = subtotal
                .checked_add(line_total)
                .ok_or_else(|| overflow("subtotal"))?;
        }

        if discount > subtotal {
            return Err(ValidationError::NegativeTotal { subtotal, discount });
        }
        let total = subtotal - discount;

        let tendered = tendered.unwrap_or(total);
        if tendered < total {
            return Err(ValidationError::InsufficientTender { total, tendered });
        }

        Ok(SaleTotals {
            subtotal,
            discount,
            total,
            tendered,
            change: tendered - total,
        })
    }
}

fn overflow(field: &str) -> ValidationError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
