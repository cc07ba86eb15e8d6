//! # Engine Error Types
//!
//! The error surface collaborators see. Wraps the domain and storage layers
//! and adds the cases only the engine can detect (illegal sale transitions,
//! retry exhaustion).

use tally_core::{CoreError, SaleStatus, ValidationError};
use tally_db::DbError;
use thiserror::Error;

/// Errors surfaced by engine operations.
///
/// Transient concurrency conflicts are retried internally; by the time a
/// `Db(ConcurrencyConflict)` reaches a caller, the bounded retries are
/// exhausted. Every other variant is returned on first occurrence, with no
/// partial state left behind.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business rule violation (insufficient stock, invalid policy, bad input).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Entity the operation needs does not exist (or is inactive).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The sale is not in a status that allows the requested transition.
    #[error("Sale {sale_id} is {status:?}, cannot {action}")]
    SaleState {
        sale_id: String,
        status: SaleStatus,
        action: String,
    },
}

impl EngineError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Whether this is an insufficient-stock rejection.
    pub fn is_insufficient_stock(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::InsufficientStock { .. }))
    }

    /// Whether this is a validation rejection.
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Core(CoreError::Validation(_)))
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
