//! # Cart Pricing
//!
//! Builds priced sale lines and totals from a cart, a sale-level discount
//! and a freight amount.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  preview_totals ──► price_cart ──► totals shown to the buyer           │
//! │                                                                         │
//! │  commit_sale ─────► price_cart ──► persisted Sale + SaleItems          │
//! │                     (same function, same numbers, no drift)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Rules
//! - `subtotal = Σ(quantity × unit_price − line_discount)`
//! - Percent discounts clamp to [0, 10000] bps; value discounts clamp to
//!   [0, subtotal + freight]
//! - `total = max(0, subtotal − discount + freight)`
//! - Line order is preserved: audit and display depend on cart order
//!
//! The stock pre-check here is advisory only - fast feedback while the
//! buyer is still looking at the cart. The authoritative check runs inside
//! the commit transaction.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Discount, Product};
use crate::{MAX_CART_LINES, MAX_DISCOUNT_BPS, MAX_LINE_QUANTITY};

// =============================================================================
// Inputs
// =============================================================================

/// One cart line joined with its product snapshot.
///
/// The product is read fresh by the caller; its price and name are frozen
/// into the priced line so later catalog edits don't rewrite history.
#[derive(Debug, Clone, Copy)]
pub struct LineInput<'a> {
    pub product: &'a Product,
    pub quantity: i64,
    /// Per-line discount in cents.
    pub discount_cents: i64,
}

// =============================================================================
// Outputs
// =============================================================================

/// A fully priced sale line, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedLine {
    pub product_id: String,
    /// Product name frozen at pricing time.
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    /// quantity × unit_price − discount.
    pub total_cents: i64,
    /// Zero-based cart position.
    pub position: i64,
    /// Whether this line moves stock at commit.
    pub track_stock: bool,
}

/// Priced cart: lines in cart order plus the settled totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedCart {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub discount: Money,
    pub freight: Money,
    pub total: Money,
    /// Σ quantity × unit weight, for per-weight freight.
    pub total_weight_grams: i64,
}

// =============================================================================
// Pricing
// =============================================================================

/// Sums line weights for freight evaluation. Weightless products count zero.
pub fn total_weight_grams(lines: &[LineInput<'_>]) -> i64 {
    lines
        .iter()
        .map(|l| l.product.weight_grams.unwrap_or(0) * l.quantity)
        .sum()
}

/// Prices a cart into persistable lines and settled totals.
///
/// ## Errors
/// - [`ValidationError::EmptyCart`] for an empty cart
/// - [`ValidationError::CartTooLarge`] beyond [`MAX_CART_LINES`]
/// - [`ValidationError::MustBePositive`] / [`ValidationError::OutOfRange`]
///   for bad quantities or line discounts
///
/// ## Example
/// ```rust,ignore
/// let priced = price_cart(&lines, Discount::Percent { bps: 1000 }, 0)?;
/// assert_eq!(priced.total.cents(), expected);
/// ```
pub fn price_cart(
    lines: &[LineInput<'_>],
    discount: Discount,
    freight_cents: i64,
) -> CoreResult<PricedCart> {
    if lines.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }
    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::CartTooLarge {
            max: MAX_CART_LINES,
        }
        .into());
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Money::zero();

    for (position, line) in lines.iter().enumerate() {
        if line.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: format!("quantity for product {}", line.product.id),
            }
            .into());
        }
        if line.quantity > MAX_LINE_QUANTITY {
            return Err(ValidationError::OutOfRange {
                field: format!("quantity for product {}", line.product.id),
                min: 1,
                max: MAX_LINE_QUANTITY,
            }
            .into());
        }

        let gross = line.product.price().multiply_quantity(line.quantity);
        if line.discount_cents < 0 || line.discount_cents > gross.cents() {
            return Err(ValidationError::OutOfRange {
                field: format!("line discount for product {}", line.product.id),
                min: 0,
                max: gross.cents(),
            }
            .into());
        }

        let line_total = gross - Money::from_cents(line.discount_cents);
        subtotal += line_total;

        priced.push(PricedLine {
            product_id: line.product.id.clone(),
            name_snapshot: line.product.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.product.price_cents,
            discount_cents: line.discount_cents,
            total_cents: line_total.cents(),
            position: position as i64,
            track_stock: line.product.track_stock,
        });
    }

    let freight = Money::from_cents(freight_cents);
    let discount_amount = match discount {
        Discount::None => Money::zero(),
        Discount::Percent { bps } => {
            let bps = bps.min(MAX_DISCOUNT_BPS);
            subtotal.percentage(bps)
        }
        Discount::Value { cents } => {
            let ceiling = (subtotal + freight).cents().max(0);
            Money::from_cents(cents.clamp(0, ceiling))
        }
    };

    let total = (subtotal - discount_amount + freight).clamp_non_negative();

    Ok(PricedCart {
        lines: priced,
        subtotal,
        discount: discount_amount,
        freight,
        total,
        total_weight_grams: total_weight_grams(lines),
    })
}

/// Advisory stock pre-check against the product snapshots in hand.
///
/// Fails fast with the first shortfall so the buyer can fix the cart before
/// committing. Passing here guarantees nothing: the commit transaction
/// re-checks against live stock.
pub fn precheck_stock(lines: &[LineInput<'_>]) -> CoreResult<()> {
    for line in lines {
        if !line.product.has_stock_for(line.quantity) {
            return Err(CoreError::insufficient_stock(
                line.product.id.clone(),
                line.quantity,
                line.product.current_stock,
            ));
        }
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
