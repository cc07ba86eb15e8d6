//! # Stock Arithmetic
//!
//! The single place new stock levels are computed. Every path that changes
//! `current_stock` (manual entries, checkout, losses, corrections) goes
//! through [`apply_movement`], so the non-negativity rule lives in exactly
//! one function.
//!
//! ## Direction Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Change                     Effect on stock                             │
//! │  ─────────────────────      ──────────────────────────────────────      │
//! │  Entry(n), Purchase(n)      current + n                                 │
//! │  Exit(n), Sale(n), Loss(n)  current − n   (guarded against < 0)        │
//! │  Adjustment(d)              current + d   (d carries its own sign;     │
//! │                                            guarded when d < 0)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An adjustment's direction is supplied explicitly by the caller. The
//! movement type alone never decides the sign of a correction.

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::MovementType;

// =============================================================================
// Stock Change
// =============================================================================

/// A requested change to a product's stock, with magnitude and direction.
///
/// Entry/Purchase/Exit/Sale/Loss carry unsigned magnitudes; their direction
/// is inherent to the variant. Adjustment carries a signed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockChange {
    Entry(i64),
    Purchase(i64),
    Exit(i64),
    Sale(i64),
    Loss(i64),
    /// Signed correction: positive adds stock, negative removes it.
    Adjustment(i64),
}

impl StockChange {
    /// The ledger movement type this change is recorded as.
    pub fn movement_type(&self) -> MovementType {
        match self {
            StockChange::Entry(_) => MovementType::Entry,
            StockChange::Purchase(_) => MovementType::Purchase,
            StockChange::Exit(_) => MovementType::Exit,
            StockChange::Sale(_) => MovementType::Sale,
            StockChange::Loss(_) => MovementType::Loss,
            StockChange::Adjustment(_) => MovementType::Adjustment,
        }
    }

    /// Unsigned magnitude, as stored on the movement row.
    pub fn magnitude(&self) -> i64 {
        match self {
            StockChange::Entry(n)
            | StockChange::Purchase(n)
            | StockChange::Exit(n)
            | StockChange::Sale(n)
            | StockChange::Loss(n) => *n,
            StockChange::Adjustment(d) => d.saturating_abs(),
        }
    }

    /// Signed effect on stock.
    pub fn signed_delta(&self) -> i64 {
        match self {
            StockChange::Entry(n) | StockChange::Purchase(n) => *n,
            StockChange::Exit(n) | StockChange::Sale(n) | StockChange::Loss(n) => -n,
            StockChange::Adjustment(d) => *d,
        }
    }
}

// =============================================================================
// Apply Movement
// =============================================================================

/// Computes the stock level after applying `change` to `current`.
///
/// Pure function: no I/O, no clock, no randomness. Callers run it against a
/// freshly read stock level inside their transaction and persist the result
/// together with the movement row.
///
/// ## Errors
/// - [`ValidationError::MustBePositive`] when a directional change carries a
///   zero or negative magnitude, or an adjustment delta is zero.
/// - [`CoreError::InsufficientStock`] when a decrease would take the level
///   below zero and `allow_negative` is false. The caller attaches the
///   product id it already holds.
/// - [`CoreError::StockOverflow`] when the arithmetic would overflow i64.
///
/// ## Example
/// ```rust
/// use tally_core::guard::{apply_movement, StockChange};
///
/// let new = apply_movement(5, StockChange::Entry(5), false).unwrap();
/// assert_eq!(new, 10);
///
/// assert!(apply_movement(1, StockChange::Sale(2), false).is_err());
/// assert_eq!(apply_movement(1, StockChange::Sale(2), true).unwrap(), -1);
/// ```
pub fn apply_movement(current: i64, change: StockChange, allow_negative: bool) -> CoreResult<i64> {
    match change {
        StockChange::Entry(n)
        | StockChange::Purchase(n)
        | StockChange::Exit(n)
        | StockChange::Sale(n)
        | StockChange::Loss(n)
            if n <= 0 =>
        {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        StockChange::Adjustment(0) => {
            return Err(ValidationError::MustBePositive {
                field: "adjustment delta".to_string(),
            }
            .into());
        }
        _ => {}
    }

    let delta = change.signed_delta();
    let new_stock = current
        .checked_add(delta)
        .ok_or(CoreError::StockOverflow {
            magnitude: change.magnitude(),
        })?;

    if new_stock < 0 && !allow_negative {
        return Err(CoreError::InsufficientStock {
            // Caller rewrites this with the real product id; the guard
            // itself has no identity context.
            product_id: String::new(),
            requested: change.magnitude(),
            available: current,
        });
    }

    Ok(new_stock)
}

// =============================================================================
// Unit Tests
// =============================================================================
