//! # Organization Policy Repository
//!
//! Loads and stores the per-organization settlement policy: freight
//! configuration plus the payment/delivery allow-lists.
//!
//! Allow-lists are stored as JSON arrays of enum strings; a row that fails
//! to decode surfaces as `DbError::CorruptData` rather than a silent
//! default.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{
    DeliveryMethod, FreightChargeType, FreightMode, FreightPolicy, OrgPolicy, PaymentMethod,
};

/// Raw row shape; allow-lists still JSON-encoded.
#[derive(Debug, FromRow)]
struct PolicyRow {
    organization_id: String,
    freight_mode: FreightMode,
    charge_type: FreightChargeType,
    fixed_value_cents: Option<i64>,
    per_weight_value_cents: Option<i64>,
    free_shipping_threshold_cents: Option<i64>,
    free_shipping_enabled: bool,
    payment_methods: String,
    delivery_methods: String,
}

impl PolicyRow {
    fn into_policy(self) -> DbResult<OrgPolicy> {
        let payment_methods: Vec<PaymentMethod> = serde_json::from_str(&self.payment_methods)?;
        let delivery_methods: Vec<DeliveryMethod> = serde_json::from_str(&self.delivery_methods)?;

        Ok(OrgPolicy {
            organization_id: self.organization_id,
            freight: FreightPolicy {
                mode: self.freight_mode,
                charge_type: self.charge_type,
                fixed_value_cents: self.fixed_value_cents,
                per_weight_value_cents: self.per_weight_value_cents,
                free_shipping_threshold_cents: self.free_shipping_threshold_cents,
                free_shipping_enabled: self.free_shipping_enabled,
            },
            payment_methods,
            delivery_methods,
        })
    }
}

/// Repository for organization settlement policies.
#[derive(Debug, Clone)]
pub struct PolicyRepository {
    pool: SqlitePool,
}

impl PolicyRepository {
    /// Creates a new PolicyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PolicyRepository { pool }
    }

    /// Loads an organization's policy, if one was ever configured.
    pub async fn get(&self, organization_id: &str) -> DbResult<Option<OrgPolicy>> {
        let row = sqlx::query_as::<_, PolicyRow>(
            "SELECT organization_id, freight_mode, charge_type, fixed_value_cents, \
             per_weight_value_cents, free_shipping_threshold_cents, free_shipping_enabled, \
             payment_methods, delivery_methods \
             FROM org_policies WHERE organization_id = ?1",
        )
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PolicyRow::into_policy).transpose()
    }

    /// Loads an organization's policy, falling back to the conservative
    /// default for organizations that never configured settlement.
    pub async fn get_or_default(&self, organization_id: &str) -> DbResult<OrgPolicy> {
        match self.get(organization_id).await? {
            Some(policy) => Ok(policy),
            None => Ok(OrgPolicy::default_policy(organization_id)),
        }
    }

    /// Creates or replaces an organization's policy.
    pub async fn upsert(&self, policy: &OrgPolicy) -> DbResult<()> {
        debug!(organization_id = %policy.organization_id, "Upserting org policy");

        let payment_methods = serde_json::to_string(&policy.payment_methods)?;
        let delivery_methods = serde_json::to_string(&policy.delivery_methods)?;

        sqlx::query(
            "INSERT INTO org_policies (
                organization_id, freight_mode, charge_type, fixed_value_cents,
                per_weight_value_cents, free_shipping_threshold_cents,
                free_shipping_enabled, payment_methods, delivery_methods, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT (organization_id) DO UPDATE SET
                freight_mode = excluded.freight_mode,
                charge_type = excluded.charge_type,
                fixed_value_cents = excluded.fixed_value_cents,
                per_weight_value_cents = excluded.per_weight_value_cents,
                free_shipping_threshold_cents = excluded.free_shipping_threshold_cents,
                free_shipping_enabled = excluded.free_shipping_enabled,
                payment_methods = excluded.payment_methods,
                delivery_methods = excluded.delivery_methods,
                updated_at = excluded.updated_at",
        )
        .bind(&policy.organization_id)
        .bind(policy.freight.mode)
        .bind(policy.freight.charge_type)
        .bind(policy.freight.fixed_value_cents)
        .bind(policy.freight.per_weight_value_cents)
        .bind(policy.freight.free_shipping_threshold_cents)
        .bind(policy.freight.free_shipping_enabled)
        .bind(payment_methods)
        .bind(delivery_methods)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
