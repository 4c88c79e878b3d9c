//! # Validation Module
//!
//! Input validation for Almacén POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP adapter (apps/api)                                      │
//! │  ├── JSON shape (deserialization)                                      │
//! │  └── Decimal → cents conversion                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (required, ranges, formats)                           │
//! │  └── Sale totals (no negative total, tender covers total)              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock_on_hand >= 0) and friends                            │
//! │  ├── UNIQUE (code)                                                     │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Nothing is written until layers 1 and 2 pass.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Field names in errors are the wire names the client sent
//! (`usuario_id`, `detalles[0].cantidad`, ...).
//!
//! ## Usage
//! ```rust
//! use almacen_core::validation::{validate_product_code, validate_quantity};
//!
//! validate_product_code("PROD-0001").unwrap();
//! validate_quantity("cantidad", 5).unwrap();
//! assert!(validate_quantity("cantidad", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::totals::SaleTotals;
use crate::types::{
    MovementKind, MovementRequest, NewProduct, PaymentMethod, ProductUpdate, SaleLine,
    SaleRequest, ValidSale,
};
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use almacen_core::validation::validate_product_code;
///
/// assert!(validate_product_code("PROD-0001").is_ok());
/// assert!(validate_product_code("").is_err());
/// assert!(validate_product_code("has space").is_err());
/// ```
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::required("codigo"));
    }

    if code.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "codigo".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "codigo".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("nombre"));
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "nombre".to_string(),
            max: 200,
        });
    }

    Ok(())
}

fn validate_note(field: &str, note: Option<&str>) -> ValidationResult<Option<String>> {
    match note.map(str::trim) {
        None | Some("") => Ok(None),
        Some(n) if n.chars().count() > 500 => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 500,
        }),
        Some(n) => Ok(Some(n.to_string())),
    }
}

/// Validates a configuration key and returns it trimmed.
///
/// Keys are at most 100 characters of letters, digits, `_`, `-` and `.`.
pub fn validate_setting_key(key: &str) -> ValidationResult<String> {
    let key = key.trim();

    if key.is_empty() {
        return Err(ValidationError::required("clave"));
    }

    if key.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "clave".to_string(),
            max: 100,
        });
    }

    if !key
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "clave".to_string(),
            reason: "must contain only letters, numbers, '_', '-' and '.'".to_string(),
        });
    }

    Ok(key.to_string())
}

/// Validates a configuration value: at most 2000 characters, may be empty.
pub fn validate_setting_value(field: &str, value: &str) -> ValidationResult<()> {
    if value.chars().count() > 2000 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 2000,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (9 999)
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive(field));
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or discount. Zero is allowed (free items, no discount).
///
/// ## Example
/// ```rust
/// use almacen_core::money::Money;
/// use almacen_core::validation::validate_amount;
///
/// assert!(validate_amount("precio", Money::from_cents(1099)).is_ok());
/// assert!(validate_amount("precio", Money::zero()).is_ok());
/// assert!(validate_amount("precio", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a stock counter (on hand or minimum).
pub fn validate_stock_value(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

fn validate_id(field: &str, id: Option<i64>) -> ValidationResult<i64> {
    match id {
        None => Err(ValidationError::required(field)),
        Some(id) if id <= 0 => Err(ValidationError::must_be_positive(field)),
        Some(id) => Ok(id),
    }
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates and normalizes a product registration.
///
/// Returns the product with trimmed strings and an empty code folded to `None`
/// (so the repository generates one).
pub fn validate_new_product(product: NewProduct) -> ValidationResult<NewProduct> {
    let code = match product.code.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(code) => {
            validate_product_code(code)?;
            Some(code.to_string())
        }
    };

    validate_product_name(&product.name)?;
    validate_amount("precio", product.price)?;
    validate_stock_value("stock_actual", product.stock_on_hand)?;
    validate_stock_value("stock_minimo", product.stock_minimum)?;

    Ok(NewProduct {
        code,
        name: product.name.trim().to_string(),
        description: validate_note("descripcion", product.description.as_deref())?,
        ..product
    })
}

/// Validates a partial product update. Only present fields are checked.
pub fn validate_product_update(update: ProductUpdate) -> ValidationResult<ProductUpdate> {
    if let Some(code) = &update.code {
        validate_product_code(code)?;
    }
    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(price) = update.price {
        validate_amount("precio", price)?;
    }
    if let Some(minimum) = update.stock_minimum {
        validate_stock_value("stock_minimo", minimum)?;
    }

    Ok(ProductUpdate {
        code: update.code.map(|c| c.trim().to_string()),
        name: update.name.map(|n| n.trim().to_string()),
        ..update
    })
}

/// Validates a manual stock movement.
///
/// `ENTRADA` and `SALIDA` take a positive quantity, `AJUSTE` a signed,
/// non-zero correction.
pub fn validate_movement_request(request: MovementRequest) -> ValidationResult<MovementRequest> {
    if request.product_id <= 0 {
        return Err(ValidationError::must_be_positive("producto_id"));
    }

    match request.kind {
        MovementKind::Entrada | MovementKind::Salida => {
            validate_quantity("cantidad", request.quantity)?;
        }
        MovementKind::Ajuste => {
            if request.quantity == 0 {
                return Err(ValidationError::InvalidFormat {
                    field: "cantidad".to_string(),
                    reason: "adjustment must not be zero".to_string(),
                });
            }
            if request.quantity.abs() > MAX_ITEM_QUANTITY {
                return Err(ValidationError::OutOfRange {
                    field: "cantidad".to_string(),
                    min: -MAX_ITEM_QUANTITY,
                    max: MAX_ITEM_QUANTITY,
                });
            }
        }
    }

    Ok(MovementRequest {
        note: validate_note("observaciones", request.note.as_deref())?,
        ..request
    })
}

/// Validates a sale request and computes its totals.
///
/// ## Flow
/// ```text
/// SaleRequest (raw)
///      │
///      ├── usuario_id present and > 0
///      ├── 1 ≤ detalles ≤ MAX_SALE_LINES
///      ├── each line: producto_id > 0, 0 < cantidad ≤ 9 999, precio ≥ 0
///      ├── descuento ≥ 0, monto_recibido ≥ 0
///      ├── metodo_pago ∈ {efectivo, tarjeta, transferencia}
///      │
///      ▼
/// SaleTotals::compute  → NegativeTotal | InsufficientTender | Overflow
///      │
///      ▼
/// ValidSale
/// ```
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<ValidSale> {
    let operator_id = validate_id("usuario_id", request.operator_id)?;

    if request.lines.is_empty() {
        return Err(ValidationError::required("detalles"));
    }
    if request.lines.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "detalles".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    let mut lines = Vec::with_capacity(request.lines.len());
    for (i, line) in request.lines.iter().enumerate() {
        let product_id = validate_id(&format!("detalles[{i}].producto_id"), line.product_id)?;
        validate_quantity(&format!("detalles[{i}].cantidad"), line.quantity)?;
        validate_amount(&format!("detalles[{i}].precio"), line.unit_price)?;

        let line_total = line
            .unit_price
            .checked_mul_quantity(line.quantity)
            .ok_or_else(|| ValidationError::Overflow {
                field: format!("detalles[{i}]"),
            })?;

        lines.push(SaleLine {
            product_id,
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total,
        });
    }

    let discount = request.discount.unwrap_or_default();
    validate_amount("descuento", discount)?;
    if let Some(tendered) = request.amount_tendered {
        validate_amount("monto_recibido", tendered)?;
    }

    let payment_method = match request.payment_method.as_deref() {
        None => return Err(ValidationError::required("metodo_pago")),
        Some(raw) => raw.parse::<PaymentMethod>()?,
    };

    let totals = SaleTotals::compute(
        lines.iter().map(|l| (l.quantity, l.unit_price)),
        discount,
        request.amount_tendered,
    )?;

    Ok(ValidSale {
        operator_id,
        lines,
        payment_method,
        totals,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
