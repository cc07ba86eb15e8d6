//! # Call Context & Engine Configuration
//!
//! Collaborator-supplied context, passed explicitly into every operation.
//! The engine holds no ambient organization, no ambient user and no global
//! configuration: what you pass is what it uses.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// =============================================================================
// Org Context
// =============================================================================

/// Who is acting, and for which organization.
///
/// Produced by the caller's auth/tenancy layer; the engine only ever trusts
/// the values handed to it per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgContext {
    /// Organization whose data this call touches.
    pub organization_id: String,
    /// User id recorded as the movement actor.
    pub actor: String,
}

impl OrgContext {
    /// Creates a context from owned or borrowed strings.
    pub fn new(organization_id: impl Into<String>, actor: impl Into<String>) -> Self {
        OrgContext {
            organization_id: organization_id.into(),
            actor: actor.into(),
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Retry knobs for optimistic-concurrency conflicts.
///
/// A conflict means another writer moved the same product (or counter row)
/// between our read and our conditional write. The transaction is rolled
/// back and re-run from the top, up to `max_retries` times, sleeping
/// `retry_backoff × attempt` between tries.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts after the first try. Default: 3
    pub max_retries: u32,
    /// Base backoff between attempts. Default: 10ms
    pub retry_backoff: Duration,
}

impl EngineConfig {
    /// Backoff before retry number `attempt` (1-based): linear in the
    /// attempt count, capped at 250ms.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let backoff = self.retry_backoff.saturating_mul(attempt);
        backoff.min(Duration::from_millis(250))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_retries: 3,
            retry_backoff: Duration::from_millis(10),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = EngineConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_millis(10));
        assert_eq!(config.backoff_for(3), Duration::from_millis(30));

        let config = EngineConfig {
            max_retries: 100,
            retry_backoff: Duration::from_millis(100),
        };
        assert_eq!(config.backoff_for(50), Duration::from_millis(250));
    }
}
