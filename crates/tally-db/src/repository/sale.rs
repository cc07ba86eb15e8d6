//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │   Draft ──────► Confirmed ──────► Completed                            │
//! │     │               │                                                   │
//! │     └───────────────┴──────────► Cancelled                             │
//! │                                                                         │
//! │  Transitions are forward-only and guarded in SQL: the UPDATE names     │
//! │  the statuses it may leave from, so a lost race shows up as            │
//! │  rows_affected = 0 instead of silently rewriting history.              │
//! │                                                                         │
//! │  Completed sales cannot be cancelled - there is no compensating        │
//! │  stock path.                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{Sale, SaleItem, SaleStatus};

const SALE_COLUMNS: &str = "id, organization_id, sale_number, status, subtotal_cents, \
     discount_cents, freight_cents, total_cents, payment_method, delivery_method, \
     customer_id, note, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, quantity, \
     unit_price_cents, discount_cents, total_cents, position, created_at";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, scoped to an organization.
    pub async fn get_by_id(&self, organization_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND organization_id = ?2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in cart order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items \
             WHERE sale_id = ?1 ORDER BY position"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists recent sales for an organization, newest first.
    pub async fn list(
        &self,
        organization_id: &str,
        offset: i64,
        limit: i64,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE organization_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(organization_id)
        .bind(if limit <= 0 { 50 } else { limit.min(200) })
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Moves a sale from one of `from` to `to`.
    ///
    /// ## Returns
    /// * `Ok(true)` - transition applied
    /// * `Ok(false)` - sale missing or not in an allowed source status
    pub async fn transition_status(
        &self,
        organization_id: &str,
        sale_id: &str,
        from: &[SaleStatus],
        to: SaleStatus,
    ) -> DbResult<bool> {
        debug!(sale_id = %sale_id, to = ?to, "Transitioning sale status");

        let placeholders = (0..from.len())
            .map(|i| format!("?{}", i + 4))
            .collect::<Vec<_>>()
            .join(", ");

        let sql = format!(
            "UPDATE sales SET status = ?1, updated_at = ?2 \
             WHERE id = ?3 AND organization_id = ?{} AND status IN ({placeholders})",
            from.len() + 4
        );

        let mut query = sqlx::query(&sql).bind(to).bind(Utc::now()).bind(sale_id);
        for status in from {
            query = query.bind(*status);
        }
        query = query.bind(organization_id);

        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Allocates the next sale number for an organization.
///
/// UPSERT on the counter row plus RETURNING, so allocation is atomic and
/// runs inside the same transaction that inserts the sale. Two concurrent
/// commits for one organization serialize on this row and receive distinct
/// numbers; an aborted commit rolls the increment back with the rest of
/// the transaction, so numbers stay monotonic per organization.
pub async fn next_sale_number<'e, E>(executor: E, organization_id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let number: i64 = sqlx::query_scalar(
        "INSERT INTO sale_counters (organization_id, last_number) VALUES (?1, 1) \
         ON CONFLICT (organization_id) DO UPDATE SET last_number = last_number + 1 \
         RETURNING last_number",
    )
    .bind(organization_id)
    .fetch_one(executor)
    .await?;

    Ok(number)
}

/// Inserts a sale header through any executor.
pub async fn insert_sale<'e, E>(executor: E, sale: &Sale) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %sale.id, sale_number = sale.sale_number, "Inserting sale");

    sqlx::query(
        "INSERT INTO sales (
            id, organization_id, sale_number, status,
            subtotal_cents, discount_cents, freight_cents, total_cents,
            payment_method, delivery_method, customer_id, note,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
    )
    .bind(&sale.id)
    .bind(&sale.organization_id)
    .bind(sale.sale_number)
    .bind(sale.status)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.freight_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.delivery_method)
    .bind(&sale.customer_id)
    .bind(&sale.note)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Inserts one sale item through any executor.
///
/// ## Snapshot Pattern
/// Product details (name, unit price) were copied onto the item at pricing
/// time, so the sale history survives later catalog edits.
pub async fn insert_item<'e, E>(executor: E, item: &SaleItem) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot, quantity,
            unit_price_cents, discount_cents, total_cents, position, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_cents)
    .bind(item.total_cents)
    .bind(item.position)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Helper to generate a new sale ID.
pub fn generate_sale_id() -> String {
    Uuid::new_v4().to_string()
}

/// Helper to generate a new sale item ID.
pub fn generate_sale_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
