//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Registration with generated `PROD-NNNN` codes
//! - Lookup, listing, partial update
//! - Soft delete
//!
//! Stock is **not** written here. `stock_on_hand` only changes through the
//! ledger (sales and manual movements) so every change leaves a movement.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use almacen_core::{generated_product_code, NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, code, name, description, price_cents, stock_on_hand, \
     stock_minimum, is_active, created_at, updated_at";

/// Attempts before giving up on a generated code that keeps colliding.
const CODE_GENERATION_ATTEMPTS: usize = 5;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.create(NewProduct { name: "Yerba 1kg".into(), ..Default::default() }).await?;
/// assert_eq!(product.code, "PROD-0001");
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products ordered by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed active products");
        Ok(products)
    }

    /// Gets a product by its ID (active or not).
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Registers a product.
    ///
    /// When no code is given one is generated from the next id
    /// (`PROD-0042`), skipping codes already taken by hand.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn create(&self, product: NewProduct) -> DbResult<Product> {
        if let Some(code) = &product.code {
            return self.insert(code, &product).await;
        }

        let mut last_err = None;
        for _ in 0..CODE_GENERATION_ATTEMPTS {
            let code = self.next_generated_code().await?;
            match self.insert(&code, &product).await {
                Err(DbError::UniqueViolation { .. }) => {
                    debug!(code = %code, "Generated code raced with another insert, retrying");
                    last_err = Some(DbError::duplicate("codigo", code));
                }
                result => return result,
            }
        }

        Err(last_err.unwrap_or_else(|| DbError::Internal("code generation failed".to_string())))
    }

    async fn insert(&self, code: &str, product: &NewProduct) -> DbResult<Product> {
        debug!(code = %code, "Inserting product");

        let now = Utc::now();
        let result = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (
                code, name, description, price_cents,
                stock_on_hand, stock_minimum, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.cents())
        .bind(product.stock_on_hand)
        .bind(product.stock_minimum)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        result.map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("codigo", code),
            other => other,
        })
    }

    /// Picks the first free `PROD-NNNN` code at or after `MAX(id) + 1`.
    async fn next_generated_code(&self) -> DbResult<String> {
        let mut sequence: i64 =
            sqlx::query_scalar("SELECT COALESCE(MAX(id), 0) + 1 FROM products")
                .fetch_one(&self.pool)
                .await?;

        loop {
            let code = generated_product_code(sequence);
            if self.get_by_code(&code).await?.is_none() {
                return Ok(code);
            }
            sequence += 1;
        }
    }

    /// Applies a partial update. Absent fields keep their stored values.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    /// * `Err(DbError::UniqueViolation)` - New code already taken
    pub async fn update(&self, id: i64, update: ProductUpdate) -> DbResult<Product> {
        debug!(id = id, "Updating product");

        let now = Utc::now();
        let code = update.code.clone();
        let result = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products SET
                code          = COALESCE(?2, code),
                name          = COALESCE(?3, name),
                description   = COALESCE(?4, description),
                price_cents   = COALESCE(?5, price_cents),
                stock_minimum = COALESCE(?6, stock_minimum),
                is_active     = COALESCE(?7, is_active),
                updated_at    = ?8
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.code)
        .bind(update.name)
        .bind(update.description)
        .bind(update.price.map(|p| p.cents()))
        .bind(update.stock_minimum)
        .bind(update.is_active)
        .bind(now)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(product)) => Ok(product),
            Ok(None) => Err(DbError::not_found("Product", id)),
            Err(e) => Err(match DbError::from(e) {
                DbError::UniqueViolation { .. } => {
                    DbError::duplicate("codigo", code.unwrap_or_default())
                }
                other => other,
            }),
        }
    }

    /// Soft-deletes a product by setting `is_active = 0`.
    ///
    /// Historical sales and movements keep referencing it.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1 AND is_active = 1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
