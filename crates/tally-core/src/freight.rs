//! # Freight Evaluation
//!
//! Turns an organization's freight policy plus a cart's subtotal and weight
//! into a freight quote.
//!
//! ## Evaluation Order (first match wins)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. free-shipping threshold active and reached  →  0  (FreeShipping)   │
//! │  2. mode = FreeShipping                         →  0  (FreeShipping)   │
//! │  3. mode = NoShipping                           →  0  (NoShipping)     │
//! │     mode = NegotiateWhatsapp                    →  0  (Negotiated)     │
//! │  4. mode = NegotiateFreight, charge = Fixed     →  fixed value         │
//! │  5. mode = NegotiateFreight, charge = PerWeight →  rate × weight(kg)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A quote of zero is NOT always "free": the basis says whether the amount
//! was waived, is pickup-only, or will be agreed out-of-band after checkout.
//! Callers that present totals must not sell a negotiated zero as free
//! shipping.
//!
//! Pure, deterministic, side-effect free.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{FreightChargeType, FreightMode, FreightPolicy};

// =============================================================================
// Freight Quote
// =============================================================================

/// Why a freight amount is what it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightBasis {
    /// A numeric charge was computed from the policy.
    Charged,
    /// Waived: threshold reached, or the organization always ships free.
    FreeShipping,
    /// No numeric value exists; the amount will be agreed out-of-band.
    Negotiated,
    /// The organization does not ship at all.
    NoShipping,
}

/// The result of evaluating a freight policy against one cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightQuote {
    pub amount: Money,
    pub basis: FreightBasis,
}

impl FreightQuote {
    /// Whether the free-shipping waiver applied (threshold or mode).
    #[inline]
    pub fn is_free_shipping(&self) -> bool {
        self.basis == FreightBasis::FreeShipping
    }

    fn zero(basis: FreightBasis) -> Self {
        FreightQuote {
            amount: Money::zero(),
            basis,
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Evaluates `policy` for a cart with the given subtotal and total weight.
///
/// ## Arguments
/// * `subtotal_cents` - Cart subtotal after line discounts, before freight
/// * `total_weight_grams` - Sum of line weights (quantity × unit weight)
/// * `policy` - The organization's freight policy
///
/// ## Errors
/// [`CoreError::InvalidPolicy`] when the charging mode is selected but the
/// chosen charge type has no configured value (Fixed without an amount,
/// PerWeight without a rate).
///
/// ## Example
/// ```rust
/// use tally_core::freight::quote;
/// use tally_core::types::{FreightChargeType, FreightMode, FreightPolicy};
///
/// let policy = FreightPolicy {
///     mode: FreightMode::NegotiateFreight,
///     charge_type: FreightChargeType::PerWeight,
///     fixed_value_cents: None,
///     per_weight_value_cents: Some(500), // 5.00 per kg
///     free_shipping_threshold_cents: Some(20_000),
///     free_shipping_enabled: true,
/// };
///
/// // 5.00/kg × 3 kg
/// assert_eq!(quote(5_000, 3_000, &policy).unwrap().amount.cents(), 1500);
///
/// // Threshold reached: waived regardless of charge type
/// assert!(quote(25_000, 3_000, &policy).unwrap().is_free_shipping());
/// ```
pub fn quote(
    subtotal_cents: i64,
    total_weight_grams: i64,
    policy: &FreightPolicy,
) -> CoreResult<FreightQuote> {
    // 1. Threshold waiver beats everything, including the mode.
    if policy.free_shipping_enabled {
        if let Some(threshold) = policy.free_shipping_threshold_cents {
            if subtotal_cents >= threshold {
                return Ok(FreightQuote::zero(FreightBasis::FreeShipping));
            }
        }
    }

    match policy.mode {
        // 2/3. Modes that never produce a numeric charge.
        FreightMode::FreeShipping => Ok(FreightQuote::zero(FreightBasis::FreeShipping)),
        FreightMode::NoShipping => Ok(FreightQuote::zero(FreightBasis::NoShipping)),
        FreightMode::NegotiateWhatsapp => Ok(FreightQuote::zero(FreightBasis::Negotiated)),

        // 4/5. The charging mode computes from the configured values.
        FreightMode::NegotiateFreight => match policy.charge_type {
            FreightChargeType::Fixed => {
                let value = policy.fixed_value_cents.ok_or_else(|| {
                    CoreError::invalid_policy("fixed charge selected without a value")
                })?;
                Ok(FreightQuote {
                    amount: Money::from_cents(value),
                    basis: FreightBasis::Charged,
                })
            }
            FreightChargeType::PerWeight => {
                let rate = policy.per_weight_value_cents.ok_or_else(|| {
                    CoreError::invalid_policy("per-weight charge selected without a rate")
                })?;
                // rate is cents per kilogram, weight is grams; half-up rounding.
                let amount = (rate as i128 * total_weight_grams as i128 + 500) / 1000;
                Ok(FreightQuote {
                    amount: Money::from_cents(amount as i64),
                    basis: FreightBasis::Charged,
                })
            }
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn base_policy() -> FreightPolicy {
        FreightPolicy {
            mode: FreightMode::NegotiateFreight,
            charge_type: FreightChargeType::Fixed,
            fixed_value_cents: Some(1200),
            per_weight_value_cents: Some(500),
            free_shipping_threshold_cents: Some(20_000),
            free_shipping_enabled: false,
        }
    }

    #[test]
    fn test_threshold_waives_regardless_of_charge_type() {
        let mut policy = base_policy();
        policy.free_shipping_enabled = true;

        let q = quote(25_000, 10_000, &policy).unwrap();
        assert!(q.is_free_shipping());
        assert_eq!(q.amount.cents(), 0);

        policy.charge_type = FreightChargeType::PerWeight;
        let q = quote(25_000, 10_000, &policy).unwrap();
        assert!(q.is_free_shipping());
    }

    #[test]
    fn test_threshold_exactly_reached() {
        let mut policy = base_policy();
        policy.free_shipping_enabled = true;

        assert!(quote(20_000, 0, &policy).unwrap().is_free_shipping());
    }

    #[test]
    fn test_threshold_not_reached_falls_through() {
        let mut policy = base_policy();
        policy.free_shipping_enabled = true;

        let q = quote(19_999, 0, &policy).unwrap();
        assert_eq!(q.basis, FreightBasis::Charged);
        assert_eq!(q.amount.cents(), 1200);
    }

    #[test]
    fn test_disabled_threshold_is_ignored() {
        let policy = base_policy();

        let q = quote(25_000, 0, &policy).unwrap();
        assert_eq!(q.basis, FreightBasis::Charged);
        assert_eq!(q.amount.cents(), 1200);
    }

    #[test]
    fn test_free_shipping_mode() {
        let mut policy = base_policy();
        policy.mode = FreightMode::FreeShipping;

        let q = quote(100, 50_000, &policy).unwrap();
        assert!(q.is_free_shipping());
    }

    #[test]
    fn test_no_shipping_mode() {
        let mut policy = base_policy();
        policy.mode = FreightMode::NoShipping;

        let q = quote(100, 0, &policy).unwrap();
        assert_eq!(q.amount.cents(), 0);
        assert_eq!(q.basis, FreightBasis::NoShipping);
        assert!(!q.is_free_shipping());
    }

    #[test]
    fn test_negotiated_zero_is_not_free() {
        let mut policy = base_policy();
        policy.mode = FreightMode::NegotiateWhatsapp;

        let q = quote(100, 0, &policy).unwrap();
        assert_eq!(q.amount.cents(), 0);
        assert_eq!(q.basis, FreightBasis::Negotiated);
        assert!(!q.is_free_shipping());
    }

    #[test]
    fn test_fixed_charge() {
        let policy = base_policy();
        let q = quote(5_000, 0, &policy).unwrap();
        assert_eq!(q.amount.cents(), 1200);
        assert_eq!(q.basis, FreightBasis::Charged);
    }

    #[test]
    fn test_per_weight_charge() {
        let mut policy = base_policy();
        policy.charge_type = FreightChargeType::PerWeight;

        // 5.00/kg × 3 kg = 15.00
        let q = quote(5_000, 3_000, &policy).unwrap();
        assert_eq!(q.amount.cents(), 1500);

        // 5.00/kg × 1.5 kg = 7.50
        let q = quote(5_000, 1_500, &policy).unwrap();
        assert_eq!(q.amount.cents(), 750);
    }

    #[test]
    fn test_per_weight_without_rate_is_invalid() {
        let mut policy = base_policy();
        policy.charge_type = FreightChargeType::PerWeight;
        policy.per_weight_value_cents = None;

        let err = quote(5_000, 1_000, &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_fixed_without_value_is_invalid() {
        let mut policy = base_policy();
        policy.fixed_value_cents = None;

        let err = quote(5_000, 0, &policy).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPolicy { .. }));
    }
}
