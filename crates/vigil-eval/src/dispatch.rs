//! Per-tick datasource dispatch.
//!
//! One tick: re-check the rule is still enabled, query every datasource
//! the rule references through its family adapter, then hand the combined
//! fingerprint set to the reconciler. Every per-datasource failure is
//! logged and skipped; only the rule-state read short-circuits the tick.

use vigil_common::keys::{AlertEventCacheKey, FaultCenterInfoCacheKey};
use vigil_common::types::AlertRule;

use crate::context::EvalContext;
use crate::recover;

pub(crate) async fn run_tick(ctx: &EvalContext, rule: &AlertRule) {
    // The enabled flag is authoritative in the catalogue, not in the
    // snapshot captured at submit time. A disabled rule consumes the tick
    // without touching datasources or the cache; its registry entry stays
    // so external callers control the lifecycle via stop/submit.
    match ctx.rules.get_rule(&rule.rule_id).await {
        Ok(snapshot) if !snapshot.enabled => return,
        Ok(_) => {}
        Err(e) => {
            tracing::error!(
                rule_id = %rule.rule_id,
                error = %e,
                "failed to read rule state, skipping tick"
            );
            return;
        }
    }

    let cur_fingerprints = collect_fingerprints(ctx, rule).await;

    let event_key = AlertEventCacheKey::new(&rule.tenant_id, &rule.fault_center_id);
    let info_key = FaultCenterInfoCacheKey::new(&rule.tenant_id, &rule.fault_center_id);
    recover::reconcile(
        ctx,
        &rule.tenant_id,
        &rule.rule_id,
        &event_key,
        &info_key,
        &cur_fingerprints,
    )
    .await;
}

/// Query each datasource the rule references and append its fingerprints.
/// Duplicates across datasources are preserved; the reconciler works in
/// set terms.
async fn collect_fingerprints(ctx: &EvalContext, rule: &AlertRule) -> Vec<String> {
    let mut cur_fingerprints = Vec::new();

    for datasource_id in &rule.datasource_id_list {
        let instance = match ctx.datasources.get_instance(datasource_id).await {
            Ok(instance) => instance,
            Err(e) => {
                tracing::error!(
                    rule_id = %rule.rule_id,
                    datasource_id = %datasource_id,
                    error = %e,
                    "failed to load datasource instance"
                );
                continue;
            }
        };

        let Some(provider) = ctx.providers.provider_for(rule.datasource_type) else {
            tracing::error!(
                rule_id = %rule.rule_id,
                datasource_type = %rule.datasource_type,
                "no adapter registered for datasource type"
            );
            continue;
        };

        if !provider.check_health(&instance).await {
            tracing::error!(
                rule_id = %rule.rule_id,
                datasource_id = %instance.id,
                "datasource health check failed"
            );
            continue;
        }

        if !instance.enabled {
            tracing::error!(
                rule_id = %rule.rule_id,
                datasource_id = %instance.id,
                "datasource is disabled"
            );
            continue;
        }

        match provider
            .query_fingerprints(datasource_id, instance.datasource_type, rule)
            .await
        {
            Ok(fingerprints) => cur_fingerprints.extend(fingerprints),
            Err(e) => {
                tracing::error!(
                    rule_id = %rule.rule_id,
                    datasource_id = %instance.id,
                    error = %e,
                    "datasource evaluation failed"
                );
            }
        }
    }

    cur_fingerprints
}
