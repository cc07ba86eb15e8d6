//! # Checkout
//!
//! Turns a validated cart into a persisted sale plus its stock movements,
//! atomically.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        commit_sale                                      │
//! │                                                                         │
//! │  Outside the transaction (pure + reads):                               │
//! │    1. validate payment/delivery against the org allow-lists            │
//! │    2. load product snapshots, price the cart, quote freight            │
//! │                                                                         │
//! │  One transaction (short - two writes per tracked line):                │
//! │    3. allocate next sale_number from the per-org counter row           │
//! │    4. INSERT sale (status = confirmed) + sale_items                    │
//! │    5. per tracked line: conditional stock write + SALE movement        │
//! │          insufficient stock → ROLLBACK: no sale, no items,             │
//! │          no movements, stock untouched                                 │
//! │          conflict → ROLLBACK, retry the whole transaction              │
//! │    6. COMMIT                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The pre-transaction pricing uses a product snapshot; the stock check
//! inside the transaction is the authoritative one. Prices are frozen at
//! snapshot time - a concurrent price edit changes future carts, not this
//! commit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tally_core::freight::{self, FreightBasis};
use tally_core::guard::StockChange;
use tally_core::pricing::{self, LineInput, PricedCart};
use tally_core::validation::{validate_actor, validate_note};
use tally_core::{
    CartLine, DeliveryMethod, Discount, PaymentMethod, Product, Sale, SaleItem, SaleStatus,
    ValidationError,
};
use tally_db::repository::sale;
use tally_db::{Database, DbError};

use crate::context::{EngineConfig, OrgContext};
use crate::error::{EngineError, EngineResult};
use crate::ledger;

// =============================================================================
// Requests & Responses
// =============================================================================

/// Everything a collaborator supplies to commit a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Cart lines in display order. Quantities are re-validated against
    /// live stock inside the commit transaction.
    pub lines: Vec<CartLine>,
    #[serde(default)]
    pub discount: Discount,
    pub payment_method: PaymentMethod,
    pub delivery_method: Option<DeliveryMethod>,
    pub customer_id: Option<String>,
    pub note: Option<String>,
}

/// Read-only totals shown before commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutPreview {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub freight_cents: i64,
    pub total_cents: i64,
    pub freight_basis: FreightBasis,
    /// True only when the free-shipping waiver applied. A negotiated or
    /// pickup-only zero reports false.
    pub is_free_shipping_applied: bool,
}

/// The persisted sale with its items, as committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommittedSale {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Checkout
// =============================================================================

/// Coordinates pricing, freight and the stock ledger into one atomic
/// "commit a sale" operation.
#[derive(Debug, Clone)]
pub struct Checkout {
    db: Database,
    config: EngineConfig,
}

impl Checkout {
    /// Creates a checkout engine with default retry configuration.
    pub fn new(db: Database) -> Self {
        Checkout {
            db,
            config: EngineConfig::default(),
        }
    }

    /// Creates a checkout engine with explicit retry configuration.
    pub fn with_config(db: Database, config: EngineConfig) -> Self {
        Checkout { db, config }
    }

    // -------------------------------------------------------------------------
    // Preview
    // -------------------------------------------------------------------------

    /// Prices a cart against the org policy without writing anything.
    ///
    /// Includes the advisory stock pre-check so the buyer hears about a
    /// shortfall before committing; passing it reserves nothing.
    pub async fn preview_totals(
        &self,
        ctx: &OrgContext,
        lines: &[CartLine],
        discount: Discount,
    ) -> EngineResult<CheckoutPreview> {
        let policy = self.db.policies().get_or_default(&ctx.organization_id).await?;
        let products = self.load_products(ctx, lines).await?;
        let inputs = join_lines(&products, lines);

        pricing::precheck_stock(&inputs)?;

        let priced = price_with_freight(&inputs, discount, &policy.freight)?;

        Ok(CheckoutPreview {
            subtotal_cents: priced.cart.subtotal.cents(),
            discount_cents: priced.cart.discount.cents(),
            freight_cents: priced.cart.freight.cents(),
            total_cents: priced.cart.total.cents(),
            freight_basis: priced.basis,
            is_free_shipping_applied: priced.basis == FreightBasis::FreeShipping,
        })
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Commits a sale: validates the request, prices it, then persists the
    /// sale, its items and one SALE movement per tracked line in a single
    /// transaction.
    ///
    /// Failure modes:
    /// - validation / allow-list rejection → error before any write
    /// - insufficient stock on ANY line → full rollback, nothing persisted
    /// - concurrent stock movement → whole transaction retried (bounded)
    pub async fn commit_sale(
        &self,
        ctx: &OrgContext,
        request: &CheckoutRequest,
    ) -> EngineResult<CommittedSale> {
        validate_actor(&ctx.actor)?;
        let note = validate_note(request.note.as_deref())?;

        let policy = self.db.policies().get_or_default(&ctx.organization_id).await?;

        if !policy.accepts_payment(request.payment_method) {
            return Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                value: format!("{:?}", request.payment_method),
            }
            .into());
        }
        if let Some(delivery) = request.delivery_method {
            if !policy.offers_delivery(delivery) {
                return Err(ValidationError::NotAllowed {
                    field: "delivery_method".to_string(),
                    value: format!("{delivery:?}"),
                }
                .into());
            }
        }

        let products = self.load_products(ctx, &request.lines).await?;
        let inputs = join_lines(&products, &request.lines);
        let priced = price_with_freight(&inputs, request.discount, &policy.freight)?;

        let mut attempt = 0;
        loop {
            match self
                .try_commit(ctx, request, &priced.cart, note.clone())
                .await
            {
                Err(EngineError::Db(err)) if err.is_transient() && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(attempt, "Sale commit conflict, retrying");
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                }
                other => return other,
            }
        }
    }

    /// One transactional commit attempt.
    async fn try_commit(
        &self,
        ctx: &OrgContext,
        request: &CheckoutRequest,
        priced: &PricedCart,
        note: Option<String>,
    ) -> EngineResult<CommittedSale> {
        let mut tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let sale_number = sale::next_sale_number(&mut *tx, &ctx.organization_id).await?;
        let now = Utc::now();
        let sale_id = sale::generate_sale_id();

        let header = Sale {
            id: sale_id.clone(),
            organization_id: ctx.organization_id.clone(),
            sale_number,
            status: SaleStatus::Confirmed,
            subtotal_cents: priced.subtotal.cents(),
            discount_cents: priced.discount.cents(),
            freight_cents: priced.freight.cents(),
            total_cents: priced.total.cents(),
            payment_method: request.payment_method,
            delivery_method: request.delivery_method,
            customer_id: request.customer_id.clone(),
            note,
            created_at: now,
            updated_at: now,
        };
        sale::insert_sale(&mut *tx, &header).await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for line in &priced.lines {
            let item = SaleItem {
                id: sale::generate_sale_item_id(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name_snapshot.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line.discount_cents,
                total_cents: line.total_cents,
                position: line.position,
                created_at: now,
            };
            sale::insert_item(&mut *tx, &item).await?;
            items.push(item);
        }

        // The authoritative stock check: one conditional write + movement
        // per tracked line, on this same transaction. Any rejection rolls
        // back the sale header and items inserted above.
        for line in &priced.lines {
            if !line.track_stock {
                continue;
            }
            ledger::apply_change_in_tx(
                &mut tx,
                ctx,
                &line.product_id,
                StockChange::Sale(line.quantity),
                Some(&sale_id),
                None,
            )
            .await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale_id,
            sale_number,
            total_cents = header.total_cents,
            items = items.len(),
            "Sale committed"
        );

        Ok(CommittedSale {
            sale: header,
            items,
        })
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Marks a confirmed sale as completed (fulfilled/delivered).
    pub async fn complete_sale(&self, ctx: &OrgContext, sale_id: &str) -> EngineResult<Sale> {
        self.transition(
            ctx,
            sale_id,
            &[SaleStatus::Confirmed],
            SaleStatus::Completed,
            "complete",
        )
        .await
    }

    /// Cancels a draft or confirmed sale.
    ///
    /// No compensating stock movement is written; a completed sale cannot
    /// be cancelled at all.
    pub async fn cancel_sale(&self, ctx: &OrgContext, sale_id: &str) -> EngineResult<Sale> {
        self.transition(
            ctx,
            sale_id,
            &[SaleStatus::Draft, SaleStatus::Confirmed],
            SaleStatus::Cancelled,
            "cancel",
        )
        .await
    }

    /// Loads a sale with its items (the audit view).
    pub async fn get_sale(&self, ctx: &OrgContext, sale_id: &str) -> EngineResult<CommittedSale> {
        let sale = self
            .db
            .sales()
            .get_by_id(&ctx.organization_id, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
        let items = self.db.sales().get_items(sale_id).await?;

        Ok(CommittedSale { sale, items })
    }

    async fn transition(
        &self,
        ctx: &OrgContext,
        sale_id: &str,
        from: &[SaleStatus],
        to: SaleStatus,
        action: &str,
    ) -> EngineResult<Sale> {
        let applied = self
            .db
            .sales()
            .transition_status(&ctx.organization_id, sale_id, from, to)
            .await?;

        if !applied {
            // Distinguish "no such sale" from "wrong status".
            let sale = self
                .db
                .sales()
                .get_by_id(&ctx.organization_id, sale_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Sale", sale_id))?;
            return Err(EngineError::SaleState {
                sale_id: sale_id.to_string(),
                status: sale.status,
                action: action.to_string(),
            });
        }

        info!(sale_id = %sale_id, to = ?to, "Sale status changed");

        self.db
            .sales()
            .get_by_id(&ctx.organization_id, sale_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Sale", sale_id))
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Loads the product snapshot for each cart line, in cart order.
    async fn load_products(
        &self,
        ctx: &OrgContext,
        lines: &[CartLine],
    ) -> EngineResult<Vec<Product>> {
        if lines.is_empty() {
            return Err(ValidationError::EmptyCart.into());
        }

        let mut products = Vec::with_capacity(lines.len());
        for line in lines {
            let db_product = self
                .db
                .products()
                .get_by_id(&ctx.organization_id, &line.product_id)
                .await?
                .filter(|p| p.is_active)
                .ok_or_else(|| EngineError::not_found("Product", &line.product_id))?;
            products.push(db_product);
        }
        Ok(products)
    }
}

/// Pairs loaded products with their cart lines, preserving order.
fn join_lines<'a>(products: &'a [Product], lines: &[CartLine]) -> Vec<LineInput<'a>> {
    products
        .iter()
        .zip(lines)
        .map(|(product, line)| LineInput {
            product,
            quantity: line.quantity,
            discount_cents: line.discount_cents,
        })
        .collect()
}

struct PricedWithFreight {
    cart: PricedCart,
    basis: FreightBasis,
}

/// Subtotal first (for the threshold), then the freight quote, then the
/// final pricing pass with the quoted amount folded in.
fn price_with_freight(
    inputs: &[LineInput<'_>],
    discount: Discount,
    policy: &tally_core::FreightPolicy,
) -> EngineResult<PricedWithFreight> {
    let base = pricing::price_cart(inputs, Discount::None, 0)?;
    let quote = freight::quote(base.subtotal.cents(), base.total_weight_grams, policy)?;
    let cart = pricing::price_cart(inputs, discount, quote.amount.cents())?;

    Ok(PricedWithFreight {
        cart,
        basis: quote.basis,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ctx, insert_product, test_db, test_policy};
    use tally_core::{FreightChargeType, FreightMode, MovementType};
    use tally_db::MovementFilter;

    fn cash_request(lines: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            lines,
            discount: Discount::None,
            payment_method: PaymentMethod::Cash,
            delivery_method: None,
            customer_id: None,
            note: None,
        }
    }

    #[tokio::test]
    async fn test_commit_happy_path() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        // price 10.00, stock 5, no shipping (default policy)
        let product = insert_product(&db, "org-1", 5, true, false).await;

        let committed = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&product.id, 2)]))
            .await
            .unwrap();

        assert_eq!(committed.sale.sale_number, 1);
        assert_eq!(committed.sale.status, SaleStatus::Confirmed);
        assert_eq!(committed.sale.subtotal_cents, 2000);
        assert_eq!(committed.sale.freight_cents, 0);
        assert_eq!(committed.sale.total_cents, 2000);
        assert_eq!(committed.items.len(), 1);
        assert_eq!(committed.items[0].quantity, 2);
        assert_eq!(committed.items[0].name_snapshot, product.name);

        // Exactly one SALE movement, linked to the sale, stock down by 2
        let movements = db
            .movements()
            .list_for_product_chronological(&product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].movement_type, MovementType::Sale);
        assert_eq!(movements[0].quantity, 2);
        assert_eq!(movements[0].sale_id.as_deref(), Some(committed.sale.id.as_str()));

        let loaded = db
            .products()
            .get_by_id("org-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_stock, 3);
    }

    #[tokio::test]
    async fn test_commit_aborts_entirely_when_second_line_is_short() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let plenty = insert_product(&db, "org-1", 10, true, false).await;
        let scarce = insert_product(&db, "org-1", 1, true, false).await;

        let err = checkout
            .commit_sale(
                &ctx(),
                &cash_request(vec![
                    CartLine::new(&plenty.id, 2),
                    CartLine::new(&scarce.id, 5),
                ]),
            )
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        // Nothing persisted: no sales, no items, no movements, stock intact
        let sales = db.sales().list("org-1", 0, 10).await.unwrap();
        assert!(sales.is_empty());
        let movements = db
            .movements()
            .list("org-1", &MovementFilter::default())
            .await
            .unwrap();
        assert!(movements.is_empty());

        let plenty_after = db
            .products()
            .get_by_id("org-1", &plenty.id)
            .await
            .unwrap()
            .unwrap();
        let scarce_after = db
            .products()
            .get_by_id("org-1", &scarce.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(plenty_after.current_stock, 10);
        assert_eq!(scarce_after.current_stock, 1);

        // The counter increment rolled back with everything else; the next
        // commit starts the sequence cleanly.
        let committed = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&plenty.id, 1)]))
            .await
            .unwrap();
        assert_eq!(committed.sale.sale_number, 1);
    }

    #[tokio::test]
    async fn test_untracked_line_moves_no_stock() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let tracked = insert_product(&db, "org-1", 5, true, false).await;
        let service = insert_product(&db, "org-1", 0, false, false).await;

        let committed = checkout
            .commit_sale(
                &ctx(),
                &cash_request(vec![
                    CartLine::new(&tracked.id, 1),
                    CartLine::new(&service.id, 3),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(committed.items.len(), 2);

        let movements = db
            .movements()
            .list("org-1", &MovementFilter::default())
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].product_id, tracked.id);
    }

    #[tokio::test]
    async fn test_sale_numbers_increase_per_org() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 50, true, false).await;

        for expected in 1..=3 {
            let committed = checkout
                .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&product.id, 1)]))
                .await
                .unwrap();
            assert_eq!(committed.sale.sale_number, expected);
        }
    }

    #[tokio::test]
    async fn test_disallowed_payment_method_rejected() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 5, true, false).await;

        let mut policy = test_policy("org-1");
        policy.payment_methods = vec![PaymentMethod::Pix];
        db.policies().upsert(&policy).await.unwrap();

        let err = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&product.id, 1)]))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(db.sales().list("org-1", 0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disallowed_delivery_method_rejected() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 5, true, false).await;

        // Default policy offers no delivery methods at all
        let mut request = cash_request(vec![CartLine::new(&product.id, 1)]);
        request.delivery_method = Some(DeliveryMethod::Shipping);

        let err = checkout.commit_sale(&ctx(), &request).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_preview_free_shipping_threshold() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        // 10.00 each, weight 500g
        let product = insert_product(&db, "org-1", 100, true, false).await;

        let mut policy = test_policy("org-1");
        policy.freight.mode = FreightMode::NegotiateFreight;
        policy.freight.charge_type = FreightChargeType::PerWeight;
        policy.freight.per_weight_value_cents = Some(500);
        policy.freight.free_shipping_enabled = true;
        policy.freight.free_shipping_threshold_cents = Some(20_000);
        db.policies().upsert(&policy).await.unwrap();

        // 25 × 10.00 = 250.00 ≥ 200.00 → free
        let preview = checkout
            .preview_totals(&ctx(), &[CartLine::new(&product.id, 25)], Discount::None)
            .await
            .unwrap();
        assert_eq!(preview.subtotal_cents, 25_000);
        assert_eq!(preview.freight_cents, 0);
        assert!(preview.is_free_shipping_applied);
        assert_eq!(preview.total_cents, 25_000);

        // 10 × 10.00 = 100.00 below threshold → per-weight: 5kg × 5.00/kg
        let preview = checkout
            .preview_totals(&ctx(), &[CartLine::new(&product.id, 10)], Discount::None)
            .await
            .unwrap();
        assert_eq!(preview.freight_cents, 2_500);
        assert!(!preview.is_free_shipping_applied);
        assert_eq!(preview.total_cents, 12_500);
    }

    #[tokio::test]
    async fn test_preview_rejects_short_stock() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 1, true, false).await;

        let err = checkout
            .preview_totals(&ctx(), &[CartLine::new(&product.id, 2)], Discount::None)
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());
    }

    #[tokio::test]
    async fn test_percent_discount_flows_into_commit() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 10, true, false).await;

        let mut request = cash_request(vec![CartLine::new(&product.id, 2)]);
        request.discount = Discount::Percent { bps: 1_000 }; // 10%

        let committed = checkout.commit_sale(&ctx(), &request).await.unwrap();
        assert_eq!(committed.sale.subtotal_cents, 2_000);
        assert_eq!(committed.sale.discount_cents, 200);
        assert_eq!(committed.sale.total_cents, 1_800);
    }

    #[tokio::test]
    async fn test_lifecycle_complete_then_cancel_refused() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 5, true, false).await;

        let committed = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&product.id, 1)]))
            .await
            .unwrap();

        let completed = checkout
            .complete_sale(&ctx(), &committed.sale.id)
            .await
            .unwrap();
        assert_eq!(completed.status, SaleStatus::Completed);

        // Completed sales have no cancellation path
        let err = checkout
            .cancel_sale(&ctx(), &committed.sale.id)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SaleState { .. }));
    }

    #[tokio::test]
    async fn test_cancel_confirmed_sale_leaves_stock_as_sold() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let product = insert_product(&db, "org-1", 5, true, false).await;

        let committed = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new(&product.id, 2)]))
            .await
            .unwrap();

        let cancelled = checkout
            .cancel_sale(&ctx(), &committed.sale.id)
            .await
            .unwrap();
        assert_eq!(cancelled.status, SaleStatus::Cancelled);

        // No compensating movement exists
        let movements = db
            .movements()
            .list_for_product_chronological(&product.id)
            .await
            .unwrap();
        assert_eq!(movements.len(), 1);
        let loaded = db
            .products()
            .get_by_id("org-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.current_stock, 3);
    }

    #[tokio::test]
    async fn test_get_sale_returns_items_in_cart_order() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());
        let first = insert_product(&db, "org-1", 5, true, false).await;
        let second = insert_product(&db, "org-1", 5, true, false).await;

        let committed = checkout
            .commit_sale(
                &ctx(),
                &cash_request(vec![
                    CartLine::new(&second.id, 1),
                    CartLine::new(&first.id, 1),
                ]),
            )
            .await
            .unwrap();

        let fetched = checkout.get_sale(&ctx(), &committed.sale.id).await.unwrap();
        assert_eq!(fetched.items.len(), 2);
        assert_eq!(fetched.items[0].product_id, second.id);
        assert_eq!(fetched.items[1].product_id, first.id);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_any_write() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());

        let err = checkout
            .commit_sale(&ctx(), &cash_request(vec![]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = test_db().await;
        let checkout = Checkout::new(db.clone());

        let err = checkout
            .commit_sale(&ctx(), &cash_request(vec![CartLine::new("ghost", 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { .. }));
    }
}
