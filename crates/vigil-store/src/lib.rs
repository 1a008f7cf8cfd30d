//! Contracts for the external stores the evaluation core depends on.
//!
//! The event cache, pending-recovery table, fault-center info, rule
//! catalogue and datasource registry are owned by an external cache or
//! database; the core only sees these traits. [`memory`] provides
//! in-process reference implementations used by the test suite and by
//! embedders that do not run a cache deployment.
//!
//! Implementations must be `Send + Sync`: every store is shared across the
//! per-rule evaluation tasks.

pub mod error;
pub mod memory;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use std::collections::HashMap;

use vigil_common::keys::{AlertEventCacheKey, FaultCenterInfoCacheKey};
use vigil_common::types::{AlertEvent, AlertRule, Datasource, FaultCenterInfo};

pub use error::{Result, StoreError};

/// A catalogue-level view of a rule, re-read on every tick.
#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub enabled: bool,
}

/// The keyed store of current alert events, addressed per fault center.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events of the fault center, keyed by fingerprint.
    async fn get_all_events(
        &self,
        key: &AlertEventCacheKey,
    ) -> Result<HashMap<String, AlertEvent>>;

    /// Upsert by `(tenant_id, fault_center_id, fingerprint)`.
    async fn push_alert_event(&self, event: &AlertEvent) -> Result<()>;

    async fn remove_alert_event(
        &self,
        tenant_id: &str,
        fault_center_id: &str,
        fingerprint: &str,
    ) -> Result<()>;
}

/// Side-table of fingerprints awaiting recovery confirmation, keyed by
/// `(tenant_id, rule_id, fingerprint)` with a first-seen unix timestamp.
///
/// `get` reports a missing key as `Ok(None)`; an `Err` always means the
/// lookup itself failed. The reconciler branches on that distinction.
#[async_trait]
pub trait PendingRecoveryStore: Send + Sync {
    async fn set(
        &self,
        tenant_id: &str,
        rule_id: &str,
        fingerprint: &str,
        first_seen: i64,
    ) -> Result<()>;

    async fn get(&self, tenant_id: &str, rule_id: &str, fingerprint: &str)
        -> Result<Option<i64>>;

    async fn delete(&self, tenant_id: &str, rule_id: &str, fingerprint: &str) -> Result<()>;

    /// All entries of one rule, `fingerprint -> first_seen`.
    async fn list(&self, tenant_id: &str, rule_id: &str) -> Result<HashMap<String, i64>>;
}

/// Recovery policy per fault center.
#[async_trait]
pub trait FaultCenterStore: Send + Sync {
    async fn get_fault_center_info(
        &self,
        key: &FaultCenterInfoCacheKey,
    ) -> Result<FaultCenterInfo>;
}

/// The persisted rule catalogue. Rules are created and mutated elsewhere;
/// the core reads snapshots and enumerates enabled rules at bootstrap.
#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get_rule(&self, rule_id: &str) -> Result<RuleSnapshot>;

    async fn list_enabled_rules(&self) -> Result<Vec<AlertRule>>;
}

/// Registry of datasource instances referenced by rules.
#[async_trait]
pub trait DatasourceStore: Send + Sync {
    async fn get_instance(&self, datasource_id: &str) -> Result<Datasource>;
}
