//! # Stock Ledger
//!
//! The write and read paths for stock. Every stock change - manual entry,
//! output, loss, correction, checkout - lands as one conditional product
//! update plus one appended movement row, inside one short transaction.
//!
//! ## The Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 record_movement (one attempt)                           │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    │                                                                    │
//! │    ├── read product (current_stock = S)                                │
//! │    │                                                                    │
//! │    ├── guard: new level N = apply_movement(S, change)                  │
//! │    │          rejection → ROLLBACK, error out, nothing written         │
//! │    │                                                                    │
//! │    ├── UPDATE products SET current_stock = N                           │
//! │    │   WHERE id = ? AND current_stock = S      ← compare-and-swap      │
//! │    │          0 rows → ROLLBACK, conflict, retry from BEGIN            │
//! │    │                                                                    │
//! │    ├── INSERT stock_movements (prev = S, new = N)                      │
//! │    │                                                                    │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Correctness never relies on in-process locks: request handlers run across
//! processes, so the only serialization points are the database write lock
//! and the conditional update. Two racing decrements of the last unit cannot
//! both pass - the loser's compare-and-swap misses and its re-run re-reads a
//! level the guard rejects.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use tally_core::guard::{self, StockChange};
use tally_core::validation::{
    validate_actor, validate_adjustment_delta, validate_note, validate_quantity,
};
use tally_core::{CoreError, StockMovement};
use tally_db::repository::{movement, product};
use tally_db::{Database, DbError, LedgerReplay, MovementFilter};

use crate::context::{EngineConfig, OrgContext};
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Receipts
// =============================================================================

/// What a successful stock write returns to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementReceipt {
    pub movement_id: String,
    pub new_stock: i64,
}

/// Result of replaying a product's ledger against its stored level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerAudit {
    pub product_id: String,
    /// The level on the product row.
    pub stored_stock: i64,
    /// The level reproduced by folding the movement chain.
    pub replayed_stock: i64,
    /// Every link's previous_stock matched the prior link's new_stock.
    pub chain_intact: bool,
    /// chain_intact and replayed == stored.
    pub consistent: bool,
    pub movement_count: usize,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// Append-only movement log plus the authoritative current-stock mutator.
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: Database,
    config: EngineConfig,
}

impl StockLedger {
    /// Creates a ledger with default retry configuration.
    pub fn new(db: Database) -> Self {
        StockLedger {
            db,
            config: EngineConfig::default(),
        }
    }

    /// Creates a ledger with explicit retry configuration.
    pub fn with_config(db: Database, config: EngineConfig) -> Self {
        StockLedger { db, config }
    }

    // -------------------------------------------------------------------------
    // Write Path
    // -------------------------------------------------------------------------

    /// Records one stock movement, retrying transient conflicts.
    ///
    /// On success the movement row and the product's new level were
    /// committed together. On any error nothing was written.
    pub async fn record_movement(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        change: StockChange,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        validate_actor(&ctx.actor)?;
        let note = validate_note(note)?;
        match change {
            StockChange::Adjustment(delta) => validate_adjustment_delta(delta)?,
            other => validate_quantity(other.magnitude())?,
        }

        let mut attempt = 0;
        loop {
            match self
                .try_record(ctx, product_id, change, note.clone(), None)
                .await
            {
                Err(EngineError::Db(err)) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(
                        product_id = %product_id,
                        attempt,
                        "Stock write conflict, retrying"
                    );
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                }
                other => return other,
            }
        }
    }

    /// Records a stock entry (restock).
    pub async fn record_entry(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        self.record_movement(ctx, product_id, StockChange::Entry(quantity), note)
            .await
    }

    /// Records a stock output (manual removal).
    ///
    /// Fails with `InsufficientStock` - leaving the level untouched - when
    /// the product tracks stock, disallows negatives, and has less than
    /// `quantity` on hand.
    pub async fn record_output(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        self.record_movement(ctx, product_id, StockChange::Exit(quantity), note)
            .await
    }

    /// Records goods received against a purchase.
    pub async fn record_purchase(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        self.record_movement(ctx, product_id, StockChange::Purchase(quantity), note)
            .await
    }

    /// Records shrinkage (damage, expiry, theft).
    pub async fn record_loss(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        quantity: i64,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        self.record_movement(ctx, product_id, StockChange::Loss(quantity), note)
            .await
    }

    /// Records a correction with an explicit signed delta.
    ///
    /// Positive deltas add stock, negative deltas remove it. The direction
    /// is always the caller's statement, never inferred.
    pub async fn record_adjustment(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        delta: i64,
        note: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        self.record_movement(ctx, product_id, StockChange::Adjustment(delta), note)
            .await
    }

    /// One transactional attempt. Conflicts bubble up for the retry loop.
    async fn try_record(
        &self,
        ctx: &OrgContext,
        product_id: &str,
        change: StockChange,
        note: Option<String>,
        sale_id: Option<&str>,
    ) -> EngineResult<MovementReceipt> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let receipt = apply_change_in_tx(&mut tx, ctx, product_id, change, sale_id, note).await?;

        tx.commit().await.map_err(DbError::from)?;

        info!(
            product_id = %product_id,
            movement_type = %change.movement_type().as_str(),
            new_stock = receipt.new_stock,
            "Stock movement recorded"
        );

        Ok(receipt)
    }

    // -------------------------------------------------------------------------
    // Read Path
    // -------------------------------------------------------------------------

    /// Lists movements for the caller's organization, newest first.
    pub async fn list_movements(
        &self,
        ctx: &OrgContext,
        filter: &MovementFilter,
    ) -> EngineResult<Vec<StockMovement>> {
        Ok(self
            .db
            .movements()
            .list(&ctx.organization_id, filter)
            .await?)
    }

    /// Replays one product's ledger against its stored stock level.
    ///
    /// The baseline is the earliest movement's `previous_stock` (products
    /// predating the ledger keep their opening level); a product with no
    /// movements is trivially consistent.
    pub async fn audit(&self, ctx: &OrgContext, product_id: &str) -> EngineResult<LedgerAudit> {
        let db_product = self
            .db
            .products()
            .get_by_id(&ctx.organization_id, product_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Product", product_id))?;

        let movements = self
            .db
            .movements()
            .list_for_product_chronological(product_id)
            .await?;

        let baseline = movements
            .first()
            .map(|m| m.previous_stock)
            .unwrap_or(db_product.current_stock);

        let LedgerReplay {
            replayed_stock,
            chain_intact,
            movement_count,
        } = fold_chain(&movements, baseline);

        debug!(
            product_id = %product_id,
            stored = db_product.current_stock,
            replayed = replayed_stock,
            "Ledger audit"
        );

        Ok(LedgerAudit {
            product_id: product_id.to_string(),
            stored_stock: db_product.current_stock,
            replayed_stock,
            chain_intact,
            consistent: chain_intact && replayed_stock == db_product.current_stock,
            movement_count,
        })
    }
}

/// Folds an already-chronological movement slice from a baseline.
fn fold_chain(movements: &[StockMovement], baseline: i64) -> LedgerReplay {
    let mut level = baseline;
    let mut chain_intact = true;

    for movement in movements {
        if movement.previous_stock != level {
            chain_intact = false;
        }
        level = movement.new_stock;
    }

    LedgerReplay {
        replayed_stock: level,
        chain_intact,
        movement_count: movements.len(),
    }
}

// =============================================================================
// Shared Transactional Step
// =============================================================================

/// Read product → guard → conditional stock write → append movement, all on
/// the caller's open transaction.
///
/// Also used by checkout, which runs one of these per tracked cart line
/// inside its single commit transaction.
pub(crate) async fn apply_change_in_tx(
    conn: &mut SqliteConnection,
    ctx: &OrgContext,
    product_id: &str,
    change: StockChange,
    sale_id: Option<&str>,
    note: Option<String>,
) -> EngineResult<MovementReceipt> {
    let db_product = product::get(&mut *conn, &ctx.organization_id, product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| EngineError::not_found("Product", product_id))?;

    let new_stock = guard::apply_movement(
        db_product.current_stock,
        change,
        db_product.allows_negative(),
    )
    .map_err(|err| match err {
        // The guard has no identity context; attach the product id here.
        CoreError::InsufficientStock {
            requested,
            available,
            ..
        } => EngineError::Core(CoreError::insufficient_stock(
            product_id, requested, available,
        )),
        other => EngineError::Core(other),
    })?;

    let now = Utc::now();

    let applied = product::try_apply_stock(
        &mut *conn,
        product_id,
        db_product.current_stock,
        new_stock,
        now,
    )
    .await?;
    if !applied {
        return Err(DbError::conflict(format!("stock moved under product {product_id}")).into());
    }

    let record = StockMovement {
        id: movement::generate_movement_id(),
        organization_id: ctx.organization_id.clone(),
        product_id: product_id.to_string(),
        movement_type: change.movement_type(),
        quantity: change.magnitude(),
        previous_stock: db_product.current_stock,
        new_stock,
        sale_id: sale_id.map(str::to_string),
        note,
        actor: ctx.actor.clone(),
        created_at: now,
    };
    movement::insert(&mut *conn, &record).await?;

    Ok(MovementReceipt {
        movement_id: record.id,
        new_stock,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ctx, insert_product, test_db};
    use tally_core::MovementType;

    #[tokio::test]
    async fn test_entry_moves_stock_and_chains() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 5, true, false).await;

        let receipt = ledger
            .record_entry(&ctx(), &product.id, 5, Some("restock"))
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, 10);

        let movements = db
            .movements()
            .list_for_product_chronological(&product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Entry);
        assert_eq!(movements[0].previous_stock, 5);
        assert_eq!(movements[0].new_stock, 10);
        assert_eq!(movements[0].note.as_deref(), Some("restock"));
        assert_eq!(movements[0].actor, "user-1");

        let loaded = db
            .products()
            .get_by_id("org-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_stock, 10);
    }

    #[tokio::test]
    async fn test_insufficient_output_writes_nothing() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 1, true, false).await;

        let err = ledger
            .record_output(&ctx(), &product.id, 2, None)
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        // Stock unchanged, ledger empty
        let loaded = db
            .products()
            .get_by_id("org-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_stock, 1);
        let movements = db
            .movements()
            .list_for_product_chronological(&product.id)
            .await
            .unwrap();
        assert!(movements.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_outputs_of_last_unit() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 1, true, false).await;

        let context = ctx();
        let (a, b) = tokio::join!(
            ledger.record_output(&context, &product.id, 1, None),
            ledger.record_output(&context, &product.id, 1, None),
        );

        // Exactly one wins; the loser sees insufficient stock.
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        let failure = if a.is_err() { a.unwrap_err() } else { b.unwrap_err() };
        assert!(failure.is_insufficient_stock());

        let loaded = db
            .products()
            .get_by_id("org-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_stock, 0);
    }

    #[tokio::test]
    async fn test_negative_allowed_product_goes_below_zero() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 0, true, true).await;

        let receipt = ledger
            .record_output(&ctx(), &product.id, 3, None)
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, -3);
    }

    #[tokio::test]
    async fn test_untracked_product_never_rejects() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 0, false, false).await;

        let receipt = ledger
            .record_output(&ctx(), &product.id, 10, None)
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, -10);
    }

    #[tokio::test]
    async fn test_adjustment_uses_explicit_sign() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 10, true, false).await;

        let receipt = ledger
            .record_adjustment(&ctx(), &product.id, -4, Some("recount"))
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, 6);

        let receipt = ledger
            .record_adjustment(&ctx(), &product.id, 2, None)
            .await
            .unwrap();
        assert_eq!(receipt.new_stock, 8);

        let movements = db
            .movements()
            .list_for_product_chronological(&product.id)
            .await
            .unwrap();
        assert_eq!(movements[0].quantity, 4); // magnitude, sign via prev/new
        assert_eq!(movements[0].signed_delta(), -4);
        assert_eq!(movements[1].signed_delta(), 2);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());

        let err = ledger
            .record_entry(&ctx(), "nope", 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ledger_replay_matches_stored_stock() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 0, true, false).await;
        let context = ctx();

        ledger
            .record_entry(&context, &product.id, 10, None)
            .await
            .unwrap();
        ledger
            .record_output(&context, &product.id, 3, None)
            .await
            .unwrap();
        ledger
            .record_adjustment(&context, &product.id, -2, None)
            .await
            .unwrap();
        ledger
            .record_purchase(&context, &product.id, 6, None)
            .await
            .unwrap();
        ledger
            .record_loss(&context, &product.id, 1, None)
            .await
            .unwrap();

        let audit = ledger.audit(&context, &product.id).await.unwrap();
        assert_eq!(audit.stored_stock, 10);
        assert_eq!(audit.replayed_stock, 10);
        assert!(audit.chain_intact);
        assert!(audit.consistent);
        assert_eq!(audit.movement_count, 5);
    }

    #[tokio::test]
    async fn test_audit_with_opening_stock_and_no_movements() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 7, true, false).await;

        let audit = ledger.audit(&ctx(), &product.id).await.unwrap();
        assert_eq!(audit.replayed_stock, 7);
        assert!(audit.consistent);
        assert_eq!(audit.movement_count, 0);
    }

    #[tokio::test]
    async fn test_list_movements_scopes_to_org() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let mine = insert_product(&db, "org-1", 10, true, false).await;
        let theirs = insert_product(&db, "org-2", 10, true, false).await;

        ledger
            .record_entry(&ctx(), &mine.id, 1, None)
            .await
            .unwrap();
        ledger
            .record_entry(&OrgContext::new("org-2", "user-2"), &theirs.id, 1, None)
            .await
            .unwrap();

        let listed = ledger
            .list_movements(&ctx(), &MovementFilter::default())
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_id, mine.id);
    }

    #[tokio::test]
    async fn test_blank_actor_rejected() {
        let db = test_db().await;
        let ledger = StockLedger::new(db.clone());
        let product = insert_product(&db, "org-1", 10, true, false).await;

        let err = ledger
            .record_entry(&OrgContext::new("org-1", "  "), &product.id, 1, None)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
