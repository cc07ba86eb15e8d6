//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  tally-engine errors (separate crate)                                  │
//! │  └── EngineError      - What collaborators see                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Collaborator        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, requested, available)
//! 3. Errors are enum variants, never String
//! 4. A failed operation leaves no partial state behind

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They are surfaced to collaborators as structured values, never as panics.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stock decrease would take the level below zero on a product that
    /// does not allow negative stock. Nothing is written when this occurs.
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// The freight policy is not usable as configured, e.g. per-weight
    /// charging selected without a configured rate.
    #[error("Invalid freight policy configuration: {reason}")]
    InvalidPolicy { reason: String },

    /// A stock computation overflowed i64. Only reachable with absurd
    /// magnitudes; surfaced instead of wrapping silently.
    #[error("Stock arithmetic overflow for magnitude {magnitude}")]
    StockOverflow { magnitude: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InsufficientStock error for the given product.
    pub fn insufficient_stock(
        product_id: impl Into<String>,
        requested: i64,
        available: i64,
    ) -> Self {
        CoreError::InsufficientStock {
            product_id: product_id.into(),
            requested,
            available,
        }
    }

    /// Creates an InvalidPolicy error.
    pub fn invalid_policy(reason: impl Into<String>) -> Self {
        CoreError::InvalidPolicy {
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller-supplied input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set (e.g., payment method not offered
    /// by the organization).
    #[error("{field} '{value}' is not allowed here")]
    NotAllowed { field: String, value: String },

    /// The cart has no lines.
    #[error("cart must contain at least one item")]
    EmptyCart,

    /// The cart exceeds the maximum number of lines.
    #[error("cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::insufficient_stock("prod-9", 5, 3);
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product prod-9: requested 5, available 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "actor".to_string(),
        };
        assert_eq!(err.to_string(), "actor is required");

        let err = ValidationError::EmptyCart;
        assert_eq!(err.to_string(), "cart must contain at least one item");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
