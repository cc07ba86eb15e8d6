//! # tally-engine: Stock Ledger + Checkout Engine
//!
//! The operations Tally exposes to its collaborators. Everything a route
//! handler or RPC server needs lives behind two services:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Engine Surface                                   │
//! │                                                                         │
//! │  StockLedger                        Checkout                            │
//! │  ───────────                        ────────                            │
//! │  record_entry                       preview_totals                      │
//! │  record_output                      commit_sale                         │
//! │  record_purchase                    complete_sale                       │
//! │  record_loss                        cancel_sale                         │
//! │  record_adjustment                  get_sale                            │
//! │  list_movements                                                         │
//! │  audit (ledger replay)                                                  │
//! │                                                                         │
//! │  Both take an explicit OrgContext { organization_id, actor } per call  │
//! │  and a Database handle at construction. No globals.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Model
//!
//! Handlers run across processes, so correctness never relies on in-process
//! locks. The two mutating operations - `record_movement` and `commit_sale`
//! - execute inside one short transaction each, guard stock with a
//! compare-and-swap on `products.current_stock`, and retry transient
//! conflicts with bounded backoff. Failed operations leave zero partial
//! state.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//! use tally_engine::{Checkout, OrgContext, StockLedger};
//!
//! let db = Database::new(DbConfig::new("./tally.db")).await?;
//! let ledger = StockLedger::new(db.clone());
//! let checkout = Checkout::new(db);
//!
//! let ctx = OrgContext::new(org_id, user_id);
//! ledger.record_entry(&ctx, &product_id, 10, Some("initial load")).await?;
//! let sale = checkout.commit_sale(&ctx, &request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod context;
pub mod error;
pub mod ledger;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{Checkout, CheckoutPreview, CheckoutRequest, CommittedSale};
pub use context::{EngineConfig, OrgContext};
pub use error::{EngineError, EngineResult};
pub use ledger::{LedgerAudit, MovementReceipt, StockLedger};

// The filter type collaborators pass to list_movements.
pub use tally_db::MovementFilter;

// =============================================================================
// Test Utilities
// =============================================================================
