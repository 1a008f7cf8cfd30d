//! The recovery reconciler.
//!
//! Each tick compares the fingerprints firing now against the fault
//! center's stored events and drives the status machine:
//!
//! - stale `PreAlert` events (no longer firing) are deleted,
//! - events waiting in `PendingRecovery` that fire again are promoted back
//!   to `Alerting`,
//! - events that stopped firing enter `PendingRecovery` and are declared
//!   `Recovered` only after the fault center's recover-wait window has
//!   passed on a later tick.
//!
//! Promotion runs before demotion so a fingerprint that flaps back within
//! one tick is treated as still firing. Only events whose `rule_id`
//! contains the evaluating rule's id are touched; composite rules emit
//! events tagged with child ids that embed the parent id, so containment,
//! not equality, is the scoping contract.

use chrono::Utc;
use std::collections::HashSet;

use vigil_common::keys::{AlertEventCacheKey, FaultCenterInfoCacheKey};
use vigil_common::types::EventStatus;

use crate::context::EvalContext;

pub(crate) async fn reconcile(
    ctx: &EvalContext,
    tenant_id: &str,
    rule_id: &str,
    event_key: &AlertEventCacheKey,
    info_key: &FaultCenterInfoCacheKey,
    cur_fingerprints: &[String],
) {
    reconcile_at(
        ctx,
        tenant_id,
        rule_id,
        event_key,
        info_key,
        cur_fingerprints,
        Utc::now().timestamp(),
    )
    .await;
}

/// Reconciliation with an explicit clock, so the hysteresis window can be
/// exercised without waiting through it.
pub(crate) async fn reconcile_at(
    ctx: &EvalContext,
    tenant_id: &str,
    rule_id: &str,
    event_key: &AlertEventCacheKey,
    info_key: &FaultCenterInfoCacheKey,
    cur_fingerprints: &[String],
    now: i64,
) {
    // Losing the event set means losing the whole picture; abort this tick
    // and let the next one retry.
    let events = match ctx.events.get_all_events(event_key).await {
        Ok(events) => events,
        Err(e) => {
            tracing::error!(
                rule_id,
                error = %e,
                "failed to load fault-center events, aborting tick"
            );
            return;
        }
    };

    let firing: HashSet<&str> = cur_fingerprints.iter().map(String::as_str).collect();

    // Pass 1: scope events to this rule and garbage-collect pre-alerts
    // that stopped firing before ever crossing their threshold.
    let mut active_fingerprints: Vec<&str> = Vec::new();
    for (fingerprint, event) in &events {
        if !event.rule_id.contains(rule_id) {
            continue;
        }

        if event.status == EventStatus::PreAlert && !firing.contains(fingerprint.as_str()) {
            if let Err(e) = ctx
                .events
                .remove_alert_event(&event.tenant_id, &event.fault_center_id, &event.fingerprint)
                .await
            {
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "failed to remove stale pre-alert event"
                );
            }
            continue;
        }

        active_fingerprints.push(fingerprint);
    }

    // Pass 2: fingerprints that fire again while waiting for recovery go
    // back to alerting and leave the pending table.
    let pending = match ctx.pending.list(tenant_id, rule_id).await {
        Ok(pending) => pending,
        Err(e) => {
            tracing::error!(
                rule_id,
                error = %e,
                "failed to list pending-recovery entries"
            );
            Default::default()
        }
    };
    if !pending.is_empty() {
        for fingerprint in cur_fingerprints {
            if !pending.contains_key(fingerprint) {
                continue;
            }
            let Some(event) = events.get(fingerprint) else {
                continue;
            };

            let mut updated = event.clone();
            if let Err(e) = updated.transition(EventStatus::Alerting) {
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "cannot promote event back to alerting"
                );
                continue;
            }
            updated.last_eval_time = now;

            if let Err(e) = ctx.events.push_alert_event(&updated).await {
                // Keep the pending entry; the next tick retries the promotion.
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "failed to write promoted event"
                );
                continue;
            }
            if let Err(e) = ctx.pending.delete(tenant_id, rule_id, fingerprint).await {
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "failed to clear pending-recovery entry"
                );
            }
        }
    }

    // Pass 3: fingerprints that were active but are absent this tick. The
    // first absent tick only records a timestamp and marks the event
    // pending; recovery is declared on a later tick once the wait window
    // has fully elapsed.
    let recover_fingerprints: Vec<&str> = active_fingerprints
        .iter()
        .copied()
        .filter(|fingerprint| !firing.contains(fingerprint))
        .collect();
    if recover_fingerprints.is_empty() {
        return;
    }

    let wait = recover_wait_time(ctx, info_key).await;
    for fingerprint in recover_fingerprints {
        let Some(event) = events.get(fingerprint) else {
            continue;
        };
        let mut updated = event.clone();

        match ctx.pending.get(tenant_id, rule_id, fingerprint).await {
            Ok(None) => {
                // First tick of absence: open the hysteresis window.
                if let Err(e) = ctx.pending.set(tenant_id, rule_id, fingerprint, now).await {
                    tracing::error!(
                        fingerprint = %fingerprint,
                        error = %e,
                        "failed to record pending-recovery timestamp"
                    );
                    continue;
                }
                if let Err(e) = updated.transition(EventStatus::PendingRecovery) {
                    tracing::error!(
                        fingerprint = %fingerprint,
                        error = %e,
                        "cannot mark event pending recovery"
                    );
                    continue;
                }
                updated.last_eval_time = now;
                if let Err(e) = ctx.events.push_alert_event(&updated).await {
                    tracing::error!(
                        fingerprint = %fingerprint,
                        error = %e,
                        "failed to write pending-recovery event"
                    );
                }
            }
            Err(e) => {
                tracing::error!(
                    fingerprint = %fingerprint,
                    error = %e,
                    "failed to read pending-recovery timestamp"
                );
                continue;
            }
            Ok(Some(first_seen)) => {
                let threshold = first_seen + wait;
                if now >= threshold && updated.status == EventStatus::PendingRecovery {
                    updated.last_eval_time = now;
                    updated.recover_time = now;
                    if let Err(e) = updated.transition(EventStatus::Recovered) {
                        tracing::error!(
                            fingerprint = %fingerprint,
                            error = %e,
                            "cannot mark event recovered"
                        );
                        continue;
                    }
                    if let Err(e) = ctx.events.push_alert_event(&updated).await {
                        tracing::error!(
                            fingerprint = %fingerprint,
                            error = %e,
                            "failed to write recovered event"
                        );
                        continue;
                    }
                    if let Err(e) = ctx.pending.delete(tenant_id, rule_id, fingerprint).await {
                        tracing::error!(
                            fingerprint = %fingerprint,
                            error = %e,
                            "failed to clear pending-recovery entry"
                        );
                    }
                }
            }
        }
    }
}

/// The fault center's hysteresis window in seconds. Zero (unset) and a
/// failed info lookup both fall back to the 1-second minimum.
async fn recover_wait_time(ctx: &EvalContext, info_key: &FaultCenterInfoCacheKey) -> i64 {
    let wait = match ctx.fault_centers.get_fault_center_info(info_key).await {
        Ok(info) => info.recover_wait_time,
        Err(e) => {
            tracing::warn!(
                key = %info_key,
                error = %e,
                "failed to load fault-center info, using minimum recover wait"
            );
            0
        }
    };
    if wait == 0 {
        1
    } else {
        wait
    }
}
