use std::collections::HashMap;

use vigil_common::keys::{AlertEventCacheKey, FaultCenterInfoCacheKey};
use vigil_common::types::{
    AlertEvent, AlertRule, Datasource, DatasourceType, EvalTimeType, EventStatus,
    FaultCenterInfo, Severity,
};

use crate::memory::{
    MemoryDatasourceStore, MemoryEventStore, MemoryFaultCenterStore, MemoryPendingStore,
    MemoryRuleStore,
};
use crate::{
    DatasourceStore, EventStore, FaultCenterStore, PendingRecoveryStore, RuleStore, StoreError,
};

fn make_event(tenant: &str, fault_center: &str, fingerprint: &str) -> AlertEvent {
    AlertEvent {
        tenant_id: tenant.to_string(),
        fault_center_id: fault_center.to_string(),
        fingerprint: fingerprint.to_string(),
        rule_id: "rule-1".to_string(),
        rule_name: "high cpu".to_string(),
        severity: Severity::Warning,
        labels: HashMap::new(),
        annotations: String::new(),
        status: EventStatus::Alerting,
        first_trigger_time: 100,
        last_eval_time: 100,
        recover_time: 0,
    }
}

#[tokio::test]
async fn event_store_upserts_by_fingerprint() {
    let store = MemoryEventStore::new();
    let key = AlertEventCacheKey::new("t1", "fc1");

    store.push_alert_event(&make_event("t1", "fc1", "fp1")).await.unwrap();

    let mut updated = make_event("t1", "fc1", "fp1");
    updated.status = EventStatus::PendingRecovery;
    store.push_alert_event(&updated).await.unwrap();

    let events = store.get_all_events(&key).await.unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events["fp1"].status, EventStatus::PendingRecovery);
}

#[tokio::test]
async fn event_store_scopes_by_fault_center() {
    let store = MemoryEventStore::new();
    store.push_alert_event(&make_event("t1", "fc1", "fp1")).await.unwrap();
    store.push_alert_event(&make_event("t1", "fc2", "fp2")).await.unwrap();

    let fc1 = store
        .get_all_events(&AlertEventCacheKey::new("t1", "fc1"))
        .await
        .unwrap();
    assert_eq!(fc1.len(), 1);
    assert!(fc1.contains_key("fp1"));
}

#[tokio::test]
async fn event_store_remove_is_idempotent() {
    let store = MemoryEventStore::new();
    store.push_alert_event(&make_event("t1", "fc1", "fp1")).await.unwrap();

    store.remove_alert_event("t1", "fc1", "fp1").await.unwrap();
    store.remove_alert_event("t1", "fc1", "fp1").await.unwrap();

    let events = store
        .get_all_events(&AlertEventCacheKey::new("t1", "fc1"))
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn pending_store_distinguishes_missing_from_present() {
    let store = MemoryPendingStore::new();

    assert_eq!(store.get("t1", "r1", "fp1").await.unwrap(), None);

    store.set("t1", "r1", "fp1", 1700000000).await.unwrap();
    assert_eq!(store.get("t1", "r1", "fp1").await.unwrap(), Some(1700000000));

    // Entries are scoped per (tenant, rule).
    assert_eq!(store.get("t1", "r2", "fp1").await.unwrap(), None);

    store.delete("t1", "r1", "fp1").await.unwrap();
    assert_eq!(store.get("t1", "r1", "fp1").await.unwrap(), None);
}

#[tokio::test]
async fn pending_store_lists_per_rule() {
    let store = MemoryPendingStore::new();
    store.set("t1", "r1", "fp1", 10).await.unwrap();
    store.set("t1", "r1", "fp2", 20).await.unwrap();
    store.set("t1", "r2", "fp3", 30).await.unwrap();

    let listed = store.list("t1", "r1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed["fp1"], 10);
    assert_eq!(listed["fp2"], 20);
}

#[tokio::test]
async fn fault_center_store_defaults_on_miss() {
    let store = MemoryFaultCenterStore::new();
    let key = FaultCenterInfoCacheKey::new("t1", "fc1");

    let info = store.get_fault_center_info(&key).await.unwrap();
    assert_eq!(info.recover_wait_time, 0);

    store.set_info(&key, FaultCenterInfo { recover_wait_time: 30 });
    let info = store.get_fault_center_info(&key).await.unwrap();
    assert_eq!(info.recover_wait_time, 30);
}

#[tokio::test]
async fn rule_store_reports_missing_rule() {
    let store = MemoryRuleStore::new();
    let err = store.get_rule("nope").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { entity: "alert_rule", .. }));
}

#[tokio::test]
async fn rule_store_lists_only_enabled() {
    let store = MemoryRuleStore::new();
    let mut rule = AlertRule {
        tenant_id: "t1".into(),
        rule_id: "r1".into(),
        rule_name: "one".into(),
        fault_center_id: "fc1".into(),
        datasource_type: DatasourceType::Prometheus,
        datasource_id_list: vec!["ds1".into()],
        eval_time_type: EvalTimeType::Second,
        eval_interval: 10,
        enabled: true,
    };
    store.insert(rule.clone());

    rule.rule_id = "r2".into();
    rule.enabled = false;
    store.insert(rule);

    let enabled = store.list_enabled_rules().await.unwrap();
    assert_eq!(enabled.len(), 1);
    assert_eq!(enabled[0].rule_id, "r1");

    store.set_enabled("r1", false);
    assert!(store.list_enabled_rules().await.unwrap().is_empty());
    assert!(!store.get_rule("r1").await.unwrap().enabled);
}

#[tokio::test]
async fn datasource_store_round_trip() {
    let store = MemoryDatasourceStore::new();
    store.insert(Datasource {
        id: "ds1".into(),
        name: "prom-main".into(),
        datasource_type: DatasourceType::Prometheus,
        url: "http://prom:9090".into(),
        enabled: true,
    });

    let instance = store.get_instance("ds1").await.unwrap();
    assert_eq!(instance.name, "prom-main");
    assert!(store.get_instance("ds2").await.is_err());
}
