use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use vigil_common::types::AlertRule;

use crate::context::EvalContext;
use crate::dispatch;

/// Registry of running rule evaluations.
///
/// Maps `rule_id` to the cancellation handle of its evaluation task. The
/// scheduler is the sole owner of rule-task lifetimes: nothing else starts
/// or stops an evaluation. Cloning the scheduler clones a handle to the
/// same registry; the mutex is held only around map access, never across
/// I/O or a tick body.
#[derive(Clone)]
pub struct EvalScheduler {
    inner: Arc<Inner>,
}

struct Inner {
    ctx: Arc<EvalContext>,
    running: Mutex<HashMap<String, CancellationToken>>,
}

impl Inner {
    fn lock_running(&self) -> std::sync::MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EvalScheduler {
    pub fn new(ctx: Arc<EvalContext>) -> Self {
        Self {
            inner: Arc::new(Inner {
                ctx,
                running: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start evaluating `rule` on its own task.
    ///
    /// First submit wins: if the rule is already running the call is a
    /// logged no-op, so a stale task can never be orphaned by a duplicate
    /// submit. Callers replacing a rule must [`stop`](Self::stop) first.
    pub fn submit(&self, rule: AlertRule) {
        let mut running = self.inner.lock_running();
        if running.contains_key(&rule.rule_id) {
            tracing::warn!(
                rule_id = %rule.rule_id,
                rule_name = %rule.rule_name,
                "rule is already running, submit ignored"
            );
            return;
        }

        let cancel = CancellationToken::new();
        running.insert(rule.rule_id.clone(), cancel.clone());
        drop(running);

        tracing::info!(
            rule_id = %rule.rule_id,
            rule_name = %rule.rule_name,
            interval = ?rule.eval_duration(),
            "rule evaluation started"
        );

        let scheduler = self.clone();
        tokio::spawn(scheduler.eval_loop(rule, cancel));
    }

    /// Signal a rule's evaluation task to stop and drop its registry entry.
    /// Idempotent: stopping an unknown rule is a no-op.
    pub fn stop(&self, rule_id: &str) {
        let mut running = self.inner.lock_running();
        if let Some(cancel) = running.remove(rule_id) {
            cancel.cancel();
            tracing::info!(rule_id, "rule evaluation stop requested");
        }
    }

    /// Stop then submit. Used externally on rule changes and internally by
    /// panic recovery.
    pub fn restart(&self, rule: AlertRule) {
        self.stop(&rule.rule_id);
        self.submit(rule);
    }

    /// Bootstrap: load every enabled rule from the catalogue and submit
    /// each on its own task. Individual failures are logged; the batch
    /// never aborts.
    pub async fn restart_all_evals(&self) {
        let rules = match self.inner.ctx.rules.list_enabled_rules().await {
            Ok(rules) => rules,
            Err(e) => {
                tracing::error!(error = %e, "failed to load enabled rules, skipping bootstrap");
                return;
            }
        };

        tracing::info!(count = rules.len(), "submitting enabled rules");

        let mut handles = Vec::with_capacity(rules.len());
        for rule in rules {
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move { scheduler.submit(rule) }));
        }
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "rule submit task failed");
            }
        }
    }

    /// Whether a rule currently has a registered evaluation task.
    pub fn is_running(&self, rule_id: &str) -> bool {
        self.inner.lock_running().contains_key(rule_id)
    }

    /// Number of registered evaluation tasks.
    pub fn running_count(&self) -> usize {
        self.inner.lock_running().len()
    }

    /// Per-rule evaluation loop.
    ///
    /// Ticks run as child tasks behind a single-permit gate: a tick that
    /// fires while the previous body is still running is dropped. The
    /// ticker is reset after each tick body completes, so the effective
    /// period is interval + body duration, matching the serial model. A
    /// panicking tick body is contained here: it is logged and the rule is
    /// restarted on a fresh task.
    async fn eval_loop(self, rule: AlertRule, cancel: CancellationToken) {
        let mut period = rule.eval_duration();
        if period.is_zero() {
            // A zero period would panic the ticker.
            tracing::warn!(
                rule_id = %rule.rule_id,
                "rule has no evaluation interval, defaulting to 1s"
            );
            period = std::time::Duration::from_secs(1);
        }
        // No immediate first fire; the first evaluation happens one full
        // interval after submit.
        let mut ticker = interval_at(Instant::now() + period, period);
        let gate = Arc::new(Semaphore::new(1));
        let mut ticks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match Arc::clone(&gate).try_acquire_owned() {
                        Ok(permit) => {
                            let ctx = Arc::clone(&self.inner.ctx);
                            let rule = rule.clone();
                            ticks.spawn(async move {
                                // Permit is released when the tick body
                                // finishes, panicking or not.
                                let _permit = permit;
                                dispatch::run_tick(&ctx, &rule).await;
                            });
                        }
                        Err(_) => {
                            tracing::debug!(
                                rule_id = %rule.rule_id,
                                "previous evaluation still running, tick dropped"
                            );
                        }
                    }
                }
                Some(finished) = ticks.join_next() => {
                    if let Err(e) = finished {
                        if e.is_panic() {
                            tracing::error!(
                                rule_id = %rule.rule_id,
                                rule_name = %rule.rule_name,
                                error = %e,
                                "evaluation tick panicked, restarting rule"
                            );
                            self.restart(rule);
                            return;
                        }
                    }
                    ticker.reset();
                }
                _ = cancel.cancelled() => {
                    tracing::info!(
                        rule_id = %rule.rule_id,
                        rule_name = %rule.rule_name,
                        "stopping rule evaluation loop"
                    );
                    // Cancellation only prevents further ticks; an
                    // in-flight tick body runs to completion.
                    while ticks.join_next().await.is_some() {}
                    return;
                }
            }
        }
    }
}
