//! # Stock Movement Repository
//!
//! Append-only access to the stock movement ledger.
//!
//! ## Ledger Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • Movements are inserted, never updated, never deleted                │
//! │  • previous_stock/new_stock chain per product:                         │
//! │      movement N+1 . previous_stock == movement N . new_stock           │
//! │  • Folding the chain chronologically reproduces current_stock          │
//! │    exactly (ledger replay)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Listing is newest-first with offset/limit pagination; replay is
//! oldest-first over one product.

use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{MovementType, StockMovement};

const MOVEMENT_COLUMNS: &str = "id, organization_id, product_id, movement_type, quantity, \
     previous_stock, new_stock, sale_id, note, actor, created_at";

/// Filters for the audit/history listing. Empty vectors mean "no filter".
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub product_ids: Vec<String>,
    pub actors: Vec<String>,
    pub movement_type: Option<MovementType>,
    pub offset: i64,
    pub limit: i64,
}

impl MovementFilter {
    /// Effective page size: defaults to 50, capped at 200.
    fn page_limit(&self) -> i64 {
        if self.limit <= 0 {
            50
        } else {
            self.limit.min(200)
        }
    }
}

/// Outcome of replaying one product's ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerReplay {
    /// Stock level reproduced by folding the chain. Equals the baseline
    /// when the product has no movements.
    pub replayed_stock: i64,
    /// Whether every link satisfied previous == prior new.
    pub chain_intact: bool,
    pub movement_count: usize,
}

/// Repository for the stock movement ledger.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists movements for an organization, newest first.
    ///
    /// Ordering is descending `created_at` with the row id as tiebreaker,
    /// so pagination is stable and restartable.
    pub async fn list(
        &self,
        organization_id: &str,
        filter: &MovementFilter,
    ) -> DbResult<Vec<StockMovement>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements WHERE organization_id = "
        ));
        qb.push_bind(organization_id);

        if !filter.product_ids.is_empty() {
            qb.push(" AND product_id IN (");
            let mut separated = qb.separated(", ");
            for id in &filter.product_ids {
                separated.push_bind(id);
            }
            separated.push_unseparated(")");
        }

        if !filter.actors.is_empty() {
            qb.push(" AND actor IN (");
            let mut separated = qb.separated(", ");
            for actor in &filter.actors {
                separated.push_bind(actor);
            }
            separated.push_unseparated(")");
        }

        if let Some(movement_type) = filter.movement_type {
            qb.push(" AND movement_type = ");
            qb.push_bind(movement_type.as_str());
        }

        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        qb.push_bind(filter.page_limit());
        qb.push(" OFFSET ");
        qb.push_bind(filter.offset.max(0));

        let movements = qb
            .build_query_as::<StockMovement>()
            .fetch_all(&self.pool)
            .await?;

        debug!(count = movements.len(), "Listed stock movements");
        Ok(movements)
    }

    /// All movements for one product, oldest first (the replay order).
    pub async fn list_for_product_chronological(
        &self,
        product_id: &str,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Replays one product's ledger.
    ///
    /// Folds the chain oldest-first, verifying that every link's
    /// `previous_stock` equals the prior link's `new_stock`. `baseline` is
    /// the stock level assumed before the first movement (zero for products
    /// whose entire history lives in the ledger).
    pub async fn replay(&self, product_id: &str, baseline: i64) -> DbResult<LedgerReplay> {
        let movements = self.list_for_product_chronological(product_id).await?;

        let mut level = baseline;
        let mut chain_intact = true;

        for movement in &movements {
            if movement.previous_stock != level {
                chain_intact = false;
            }
            level = movement.new_stock;
        }

        Ok(LedgerReplay {
            replayed_stock: level,
            chain_intact,
            movement_count: movements.len(),
        })
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

/// Appends a movement row through any executor.
///
/// Runs inside the same transaction that writes the product's new stock
/// level; the two writes land or roll back together.
pub async fn insert<'e, E>(executor: E, movement: &StockMovement) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(
        product_id = %movement.product_id,
        movement_type = %movement.movement_type.as_str(),
        quantity = movement.quantity,
        "Appending stock movement"
    );

    sqlx::query(
        "INSERT INTO stock_movements (
            id, organization_id, product_id, movement_type, quantity,
            previous_stock, new_stock, sale_id, note, actor, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&movement.id)
    .bind(&movement.organization_id)
    .bind(&movement.product_id)
    .bind(movement.movement_type)
    .bind(movement.quantity)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(&movement.sale_id)
    .bind(&movement.note)
    .bind(&movement.actor)
    .bind(movement.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Helper to generate a new movement ID.
pub fn generate_movement_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use chrono::Utc;
    use tally_core::Product;

    async fn setup_product(db: &Database, org: &str, stock: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            organization_id: org.to_string(),
            sku: format!("SKU-{}", &generate_product_id()[..8]),
            name: "Test product".to_string(),
            price_cents: 1000,
            weight_grams: None,
            current_stock: stock,
            min_stock: 0,
            track_stock: true,
            allow_negative_stock: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    fn movement(
        org: &str,
        product_id: &str,
        movement_type: MovementType,
        quantity: i64,
        previous: i64,
        new: i64,
        actor: &str,
    ) -> StockMovement {
        StockMovement {
            id: generate_movement_id(),
            organization_id: org.to_string(),
            product_id: product_id.to_string(),
            movement_type,
            quantity,
            previous_stock: previous,
            new_stock: new,
            sale_id: None,
            note: None,
            actor: actor.to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = setup_product(&db, "org-1", 0).await;

        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Entry, 5, 0, 5, "alice"),
        )
        .await
        .unwrap();
        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Exit, 2, 5, 3, "bob"),
        )
        .await
        .unwrap();

        let listed = db
            .movements()
            .list("org-1", &MovementFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        // Newest first: the exit comes before the entry
        assert_eq!(listed[0].movement_type, MovementType::Exit);
        assert_eq!(listed[1].movement_type, MovementType::Entry);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = setup_product(&db, "org-1", 0).await;
        let b = setup_product(&db, "org-1", 0).await;

        insert(
            db.pool(),
            &movement("org-1", &a.id, MovementType::Entry, 5, 0, 5, "alice"),
        )
        .await
        .unwrap();
        insert(
            db.pool(),
            &movement("org-1", &b.id, MovementType::Loss, 1, 0, -1, "bob"),
        )
        .await
        .unwrap();

        let by_product = db
            .movements()
            .list(
                "org-1",
                &MovementFilter {
                    product_ids: vec![a.id.clone()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product[0].product_id, a.id);

        let by_actor = db
            .movements()
            .list(
                "org-1",
                &MovementFilter {
                    actors: vec!["bob".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_actor.len(), 1);
        assert_eq!(by_actor[0].actor, "bob");

        let by_type = db
            .movements()
            .list(
                "org-1",
                &MovementFilter {
                    movement_type: Some(MovementType::Loss),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_type.len(), 1);
        assert_eq!(by_type[0].movement_type, MovementType::Loss);
    }

    #[tokio::test]
    async fn test_pagination() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = setup_product(&db, "org-1", 0).await;

        let mut level = 0;
        for _ in 0..5 {
            insert(
                db.pool(),
                &movement(
                    "org-1",
                    &product.id,
                    MovementType::Entry,
                    1,
                    level,
                    level + 1,
                    "alice",
                ),
            )
            .await
            .unwrap();
            level += 1;
        }

        let page = db
            .movements()
            .list(
                "org-1",
                &MovementFilter {
                    limit: 2,
                    offset: 0,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);

        let rest = db
            .movements()
            .list(
                "org-1",
                &MovementFilter {
                    limit: 10,
                    offset: 2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(rest.len(), 3);
    }

    #[tokio::test]
    async fn test_replay_folds_chain() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = setup_product(&db, "org-1", 0).await;

        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Entry, 10, 0, 10, "a"),
        )
        .await
        .unwrap();
        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Sale, 3, 10, 7, "a"),
        )
        .await
        .unwrap();
        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Adjustment, 2, 7, 9, "a"),
        )
        .await
        .unwrap();

        let replay = db.movements().replay(&product.id, 0).await.unwrap();
        assert_eq!(replay.replayed_stock, 9);
        assert!(replay.chain_intact);
        assert_eq!(replay.movement_count, 3);
    }

    #[tokio::test]
    async fn test_replay_detects_broken_chain() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = setup_product(&db, "org-1", 0).await;

        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Entry, 10, 0, 10, "a"),
        )
        .await
        .unwrap();
        // previous_stock 8 does not match the prior new_stock 10
        insert(
            db.pool(),
            &movement("org-1", &product.id, MovementType::Sale, 3, 8, 5, "a"),
        )
        .await
        .unwrap();

        let replay = db.movements().replay(&product.id, 0).await.unwrap();
        assert!(!replay.chain_intact);
    }

    #[tokio::test]
    async fn test_replay_empty_ledger_returns_baseline() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = setup_product(&db, "org-1", 4).await;

        let replay = db.movements().replay(&product.id, 4).await.unwrap();
        assert_eq!(replay.replayed_stock, 4);
        assert!(replay.chain_intact);
        assert_eq!(replay.movement_count, 0);
    }
}
