//! In-memory reference stores.
//!
//! These back the test suite and embedders that run without an external
//! cache. Locks are plain `std::sync` and are never held across an await.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use vigil_common::keys::{AlertEventCacheKey, FaultCenterInfoCacheKey};
use vigil_common::types::{AlertEvent, AlertRule, Datasource, FaultCenterInfo};

use crate::{
    DatasourceStore, EventStore, FaultCenterStore, PendingRecoveryStore, Result, RuleSnapshot,
    RuleStore, StoreError,
};

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Event cache keyed by [`AlertEventCacheKey`], fingerprint-unique within
/// each fault center.
#[derive(Default)]
pub struct MemoryEventStore {
    events: RwLock<HashMap<String, HashMap<String, AlertEvent>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn get_all_events(
        &self,
        key: &AlertEventCacheKey,
    ) -> Result<HashMap<String, AlertEvent>> {
        let events = read_lock(&self.events);
        Ok(events.get(key.as_str()).cloned().unwrap_or_default())
    }

    async fn push_alert_event(&self, event: &AlertEvent) -> Result<()> {
        let key = AlertEventCacheKey::new(&event.tenant_id, &event.fault_center_id);
        let mut events = write_lock(&self.events);
        events
            .entry(key.as_str().to_string())
            .or_default()
            .insert(event.fingerprint.clone(), event.clone());
        Ok(())
    }

    async fn remove_alert_event(
        &self,
        tenant_id: &str,
        fault_center_id: &str,
        fingerprint: &str,
    ) -> Result<()> {
        let key = AlertEventCacheKey::new(tenant_id, fault_center_id);
        let mut events = write_lock(&self.events);
        if let Some(center) = events.get_mut(key.as_str()) {
            center.remove(fingerprint);
        }
        Ok(())
    }
}

/// Pending-recovery table keyed by `(tenant, rule)` then fingerprint.
#[derive(Default)]
pub struct MemoryPendingStore {
    entries: RwLock<HashMap<String, HashMap<String, i64>>>,
}

impl MemoryPendingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn scope(tenant_id: &str, rule_id: &str) -> String {
        format!("{tenant_id}:{rule_id}")
    }
}

#[async_trait]
impl PendingRecoveryStore for MemoryPendingStore {
    async fn set(
        &self,
        tenant_id: &str,
        rule_id: &str,
        fingerprint: &str,
        first_seen: i64,
    ) -> Result<()> {
        let mut entries = write_lock(&self.entries);
        entries
            .entry(Self::scope(tenant_id, rule_id))
            .or_default()
            .insert(fingerprint.to_string(), first_seen);
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: &str,
        rule_id: &str,
        fingerprint: &str,
    ) -> Result<Option<i64>> {
        let entries = read_lock(&self.entries);
        Ok(entries
            .get(&Self::scope(tenant_id, rule_id))
            .and_then(|scope| scope.get(fingerprint))
            .copied())
    }

    async fn delete(&self, tenant_id: &str, rule_id: &str, fingerprint: &str) -> Result<()> {
        let mut entries = write_lock(&self.entries);
        if let Some(scope) = entries.get_mut(&Self::scope(tenant_id, rule_id)) {
            scope.remove(fingerprint);
        }
        Ok(())
    }

    async fn list(&self, tenant_id: &str, rule_id: &str) -> Result<HashMap<String, i64>> {
        let entries = read_lock(&self.entries);
        Ok(entries
            .get(&Self::scope(tenant_id, rule_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// Fault-center policy records. Unknown keys resolve to the default policy,
/// matching a cache miss on the real backend.
#[derive(Default)]
pub struct MemoryFaultCenterStore {
    infos: RwLock<HashMap<String, FaultCenterInfo>>,
}

impl MemoryFaultCenterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info(&self, key: &FaultCenterInfoCacheKey, info: FaultCenterInfo) {
        let mut infos = write_lock(&self.infos);
        infos.insert(key.as_str().to_string(), info);
    }
}

#[async_trait]
impl FaultCenterStore for MemoryFaultCenterStore {
    async fn get_fault_center_info(
        &self,
        key: &FaultCenterInfoCacheKey,
    ) -> Result<FaultCenterInfo> {
        let infos = read_lock(&self.infos);
        Ok(infos.get(key.as_str()).cloned().unwrap_or_default())
    }
}

/// Rule catalogue backed by a map.
#[derive(Default)]
pub struct MemoryRuleStore {
    rules: RwLock<HashMap<String, AlertRule>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, rule: AlertRule) {
        let mut rules = write_lock(&self.rules);
        rules.insert(rule.rule_id.clone(), rule);
    }

    pub fn set_enabled(&self, rule_id: &str, enabled: bool) {
        let mut rules = write_lock(&self.rules);
        if let Some(rule) = rules.get_mut(rule_id) {
            rule.enabled = enabled;
        }
    }
}

#[async_trait]
impl RuleStore for MemoryRuleStore {
    async fn get_rule(&self, rule_id: &str) -> Result<RuleSnapshot> {
        let rules = read_lock(&self.rules);
        rules
            .get(rule_id)
            .map(|rule| RuleSnapshot {
                enabled: rule.enabled,
            })
            .ok_or_else(|| StoreError::NotFound {
                entity: "alert_rule",
                key: rule_id.to_string(),
            })
    }

    async fn list_enabled_rules(&self) -> Result<Vec<AlertRule>> {
        let rules = read_lock(&self.rules);
        Ok(rules.values().filter(|rule| rule.enabled).cloned().collect())
    }
}

/// Datasource registry backed by a map.
#[derive(Default)]
pub struct MemoryDatasourceStore {
    instances: RwLock<HashMap<String, Datasource>>,
}

impl MemoryDatasourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, instance: Datasource) {
        let mut instances = write_lock(&self.instances);
        instances.insert(instance.id.clone(), instance);
    }
}

#[async_trait]
impl DatasourceStore for MemoryDatasourceStore {
    async fn get_instance(&self, datasource_id: &str) -> Result<Datasource> {
        let instances = read_lock(&self.instances);
        instances
            .get(datasource_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                entity: "datasource",
                key: datasource_id.to_string(),
            })
    }
}
