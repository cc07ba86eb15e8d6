//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Writes Are Conditional
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                Compare-And-Swap Stock Update                            │
//! │                                                                         │
//! │  ❌ WRONG: Unconditional write (races with concurrent movements)       │
//! │     UPDATE products SET current_stock = 7 WHERE id = ?                 │
//! │                                                                         │
//! │  ✅ CORRECT: Conditional on the level the caller just read             │
//! │     UPDATE products SET current_stock = ?new                           │
//! │     WHERE id = ? AND current_stock = ?expected                         │
//! │                                                                         │
//! │  rows_affected = 0  →  someone moved stock first  →  caller retries    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The read-guard-write sequence lives in tally-engine; this module only
//! provides the primitives.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tally_core::Product;

const PRODUCT_COLUMNS: &str = "id, organization_id, sku, name, price_cents, weight_grams, \
     current_stock, min_stock, track_stock, allow_negative_stock, is_active, \
     created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID, scoped to an organization.
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Product>> {
        get(&self.pool, organization_id, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, organization_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE organization_id = ?1 AND sku = ?2"
        ))
        .bind(organization_id)
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products for an organization, sorted by name.
    pub async fn list_active(&self, organization_id: &str, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE organization_id = ?1 AND is_active = 1 \
             ORDER BY name LIMIT ?2"
        ))
        .bind(organization_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists for the org
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, organization_id, sku, name, price_cents, weight_grams,
                current_stock, min_stock, track_stock, allow_negative_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        )
        .bind(&product.id)
        .bind(&product.organization_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.weight_grams)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(product.track_stock)
        .bind(product.allow_negative_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical sales and movements keep referencing it.
    pub async fn soft_delete(&self, organization_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?3 \
             WHERE id = ?1 AND organization_id = ?2",
        )
        .bind(id)
        .bind(organization_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products for an organization (for diagnostics).
    pub async fn count(&self, organization_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE organization_id = ?1 AND is_active = 1",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Gets a product through any executor, so it can run inside a caller's
/// transaction and read the stock level that transaction will update.
pub async fn get<'e, E>(
    executor: E,
    organization_id: &str,
    id: &str,
) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND organization_id = ?2"
    ))
    .bind(id)
    .bind(organization_id)
    .fetch_optional(executor)
    .await?;

    Ok(product)
}

/// Conditionally writes a new stock level.
///
/// The write only lands if `current_stock` still equals `expected_stock` -
/// the level the caller read at the start of its transaction.
///
/// ## Returns
/// * `Ok(true)` - stock written
/// * `Ok(false)` - another writer changed the level first; caller retries
pub async fn try_apply_stock<'e, E>(
    executor: E,
    id: &str,
    expected_stock: i64,
    new_stock: i64,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        "UPDATE products SET current_stock = ?3, updated_at = ?4 \
         WHERE id = ?1 AND current_stock = ?2",
    )
    .bind(id)
    .bind(expected_stock)
    .bind(new_stock)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
