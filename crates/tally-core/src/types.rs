//! # Domain Types
//!
//! Core domain types used throughout Tally.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  StockMovement  │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  movement_type  │   │  sale_number    │       │
//! │  │  current_stock  │   │  previous_stock │   │  status         │       │
//! │  │  track_stock    │   │  new_stock      │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  MovementType   │   │   SaleStatus    │   │   OrgPolicy     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Entry, Exit    │   │  Draft          │   │  FreightPolicy  │       │
//! │  │  Sale, Purchase │   │  Confirmed      │   │  payment list   │       │
//! │  │  Adjustment,    │   │  Completed      │   │  delivery list  │       │
//! │  │  Loss           │   │  Cancelled      │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (sku, sale_number) - human-readable, scoped per organization
//!
//! ## Closed Enumerations
//! Movement types, sale statuses, payment/delivery methods and freight modes
//! are real enums validated at deserialization time, never free-form strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Movement Type
// =============================================================================

/// The kind of a stock movement, as stored in the ledger.
///
/// Entry and Purchase increase stock; Exit, Sale and Loss decrease it.
/// Adjustment carries no inherent direction: its sign comes from the caller
/// (see [`crate::guard::StockChange`]) and is recoverable from the stored
/// `previous_stock`/`new_stock` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Manual restock (goods received outside a purchase order).
    Entry,
    /// Manual removal (internal use, transfer out).
    Exit,
    /// Stock sold through checkout. Always linked to a sale.
    Sale,
    /// Goods received against a purchase.
    Purchase,
    /// Correction with an explicit signed delta (recount, audit fix).
    Adjustment,
    /// Shrinkage: damage, expiry, theft.
    Loss,
}

impl MovementType {
    /// Stable string form, matching the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Entry => "entry",
            MovementType::Exit => "exit",
            MovementType::Sale => "sale",
            MovementType::Purchase => "purchase",
            MovementType::Adjustment => "adjustment",
            MovementType::Loss => "loss",
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product whose stock the ledger tracks.
///
/// `current_stock` is owned by the ledger: it is mutated exclusively inside
/// the same transaction that appends the corresponding movement row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Organization this product belongs to.
    pub organization_id: String,

    /// Stock Keeping Unit - business identifier, unique per organization.
    pub sku: String,

    /// Display name shown on sale items (snapshotted at sale time).
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Unit weight in grams, used for per-weight freight. None = weightless.
    pub weight_grams: Option<i64>,

    /// Current stock level. Authoritative; updated only by the ledger.
    pub current_stock: i64,

    /// Low-stock alert threshold.
    pub min_stock: i64,

    /// Whether stock is tracked for this product.
    pub track_stock: bool,

    /// Allow stock to go below zero even while tracked.
    pub allow_negative_stock: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether stock for this product may go negative.
    ///
    /// Untracked products are implicitly unconstrained: not tracking stock
    /// means never rejecting a sale for lack of it.
    #[inline]
    pub fn allows_negative(&self) -> bool {
        self.allow_negative_stock || !self.track_stock
    }

    /// Advisory check: can `quantity` units be taken from the current level?
    ///
    /// This is the fast-feedback check used while building a cart. The
    /// authoritative check runs inside the commit transaction.
    pub fn has_stock_for(&self, quantity: i64) -> bool {
        if !self.track_stock {
            return true;
        }
        if self.current_stock >= quantity {
            return true;
        }
        self.allow_negative_stock
    }

    /// Whether the current level is at or below the alert threshold.
    pub fn is_low_stock(&self) -> bool {
        self.track_stock && self.current_stock <= self.min_stock
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// One append-only record of a stock change.
///
/// Movements are created once and never mutated or deleted. For a given
/// product, each movement's `previous_stock` equals the prior movement's
/// `new_stock`, so folding the ledger chronologically reconstructs the
/// current level exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub organization_id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Unsigned magnitude of the change. Direction comes from the type,
    /// or for adjustments from the previous/new pair.
    pub quantity: i64,
    /// Stock level immediately before this movement.
    pub previous_stock: i64,
    /// Stock level immediately after this movement.
    pub new_stock: i64,
    /// Set for Sale movements: the sale that consumed the stock.
    pub sale_id: Option<String>,
    /// Free-form operator note.
    pub note: Option<String>,
    /// Who caused the movement (user id from the auth context).
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    /// Signed effect of this movement on stock (`new_stock - previous_stock`).
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.new_stock - self.previous_stock
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Transitions are forward-only: Draft → Confirmed → Completed. Cancelled is
/// reachable from Draft or Confirmed. A Completed sale cannot be cancelled;
/// there is no compensating-movement path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Sale is being assembled; nothing has been reserved.
    Draft,
    /// Sale committed: items persisted, stock moved.
    Confirmed,
    /// Sale fulfilled/delivered.
    Completed,
    /// Sale abandoned before completion.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Draft
    }
}

// =============================================================================
// Payment & Delivery Methods
// =============================================================================

/// How the customer pays. Validated against the organization's allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Pix,
    CreditCard,
    DebitCard,
    BankTransfer,
}

impl PaymentMethod {
    /// All methods, used as the default allow-list.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Pix,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::BankTransfer,
    ];
}

/// How the goods reach the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    /// Customer collects at the store.
    Pickup,
    /// Store's own delivery (motoboy, local courier).
    LocalDelivery,
    /// Carrier shipping.
    Shipping,
}

// =============================================================================
// Sale
// =============================================================================

/// A committed or in-progress sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub organization_id: String,
    /// Monotonically increasing per organization; allocated inside the
    /// commit transaction, never reused.
    pub sale_number: i64,
    pub status: SaleStatus,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub freight_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub delivery_method: Option<DeliveryMethod>,
    pub customer_id: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Quantity sold.
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// Line total (unit_price × quantity − discount).
    pub total_cents: i64,
    /// Zero-based position in the cart. Preserves insertion order for
    /// audit and display.
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

// =============================================================================
// Discount
// =============================================================================

/// A sale-level discount, applied to the subtotal at pricing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Discount {
    /// No discount.
    None,
    /// Percentage of the subtotal, in basis points (1000 = 10%).
    /// Clamped to [0, 10000] at pricing time.
    Percent { bps: u32 },
    /// Fixed amount in cents. Clamped to [0, subtotal + freight].
    Value { cents: i64 },
}

impl Default for Discount {
    fn default() -> Self {
        Discount::None
    }
}

// =============================================================================
// Freight Policy
// =============================================================================

/// How an organization charges for shipping, when it charges at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum FreightMode {
    /// Freight agreed over chat after checkout; no numeric value here.
    NegotiateWhatsapp,
    /// Freight quoted by the seller out-of-band.
    NegotiateFreight,
    /// Seller always ships free.
    FreeShipping,
    /// Seller does not ship (pickup only).
    NoShipping,
}

/// How a numeric freight charge is computed when the mode charges one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum FreightChargeType {
    /// One flat amount per order.
    Fixed,
    /// Rate per kilogram of total cart weight.
    PerWeight,
}

/// Per-organization freight configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreightPolicy {
    pub mode: FreightMode,
    pub charge_type: FreightChargeType,
    /// Flat charge in cents. Required when `charge_type` is Fixed.
    pub fixed_value_cents: Option<i64>,
    /// Cents per kilogram. Required when `charge_type` is PerWeight.
    pub per_weight_value_cents: Option<i64>,
    /// Subtotal at or above which shipping is free, in cents.
    pub free_shipping_threshold_cents: Option<i64>,
    /// Whether the free-shipping threshold is active.
    pub free_shipping_enabled: bool,
}

impl FreightPolicy {
    /// Pickup-only policy: never charges, never ships.
    pub fn no_shipping() -> Self {
        FreightPolicy {
            mode: FreightMode::NoShipping,
            charge_type: FreightChargeType::Fixed,
            fixed_value_cents: None,
            per_weight_value_cents: None,
            free_shipping_threshold_cents: None,
            free_shipping_enabled: false,
        }
    }
}

// =============================================================================
// Organization Policy
// =============================================================================

/// Everything checkout needs to know about one organization:
/// the freight policy plus the payment/delivery allow-lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgPolicy {
    pub organization_id: String,
    pub freight: FreightPolicy,
    /// Payment methods this organization accepts.
    pub payment_methods: Vec<PaymentMethod>,
    /// Delivery methods this organization offers. Empty = delivery method
    /// may not be supplied at checkout.
    pub delivery_methods: Vec<DeliveryMethod>,
}

impl OrgPolicy {
    /// Conservative defaults for an organization that never configured
    /// settlement: pickup-only, every payment method accepted.
    pub fn default_policy(organization_id: impl Into<String>) -> Self {
        OrgPolicy {
            organization_id: organization_id.into(),
            freight: FreightPolicy::no_shipping(),
            payment_methods: PaymentMethod::ALL.to_vec(),
            delivery_methods: Vec::new(),
        }
    }

    /// Whether the organization accepts this payment method.
    pub fn accepts_payment(&self, method: PaymentMethod) -> bool {
        self.payment_methods.contains(&method)
    }

    /// Whether the organization offers this delivery method.
    pub fn offers_delivery(&self, method: DeliveryMethod) -> bool {
        self.delivery_methods.contains(&method)
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart as supplied at commit time.
///
/// Quantities arrive from the client and are re-validated against live
/// stock inside the commit transaction; nothing here is trusted as a
/// reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    /// Quantity requested. Must be positive.
    pub quantity: i64,
    /// Per-line discount in cents, already agreed with the customer.
    pub discount_cents: i64,
}

impl CartLine {
    /// A plain line with no per-line discount.
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
            discount_cents: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
