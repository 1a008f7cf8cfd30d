//! Datasource adapter seam.
//!
//! Concrete backend adapters (PromQL evaluation, log queries, trace
//! queries, cloud metric APIs, Kubernetes event streams) live outside the
//! core. The core needs exactly one capability from each: given a rule and
//! a datasource instance, produce the set of firing fingerprints for this
//! tick. [`EvalProvider`] captures that capability plus a health probe, and
//! [`ProviderRouter`] routes a rule's datasource type to the adapter
//! registered for its family.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use vigil_common::types::{AlertRule, Datasource, DatasourceType, ProviderFamily};

/// One backend-family adapter.
///
/// Adapters log their own query internals; callers treat an `Err` as "this
/// datasource produced nothing this tick" and move on.
#[async_trait::async_trait]
pub trait EvalProvider: Send + Sync {
    /// The family this adapter serves; used as its routing key.
    fn family(&self) -> ProviderFamily;

    /// Probe whether the backend behind `instance` is reachable.
    async fn check_health(&self, instance: &Datasource) -> bool;

    /// Evaluate `rule` against one datasource instance and return the
    /// fingerprints firing this tick.
    async fn query_fingerprints(
        &self,
        datasource_id: &str,
        instance_type: DatasourceType,
        rule: &AlertRule,
    ) -> Result<Vec<String>>;
}

/// Routes datasource types to registered family adapters.
///
/// A family with no registered adapter is simply unroutable; the
/// dispatcher skips such datasources.
#[derive(Default)]
pub struct ProviderRouter {
    providers: HashMap<ProviderFamily, Arc<dyn EvalProvider>>,
}

impl ProviderRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its family, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn EvalProvider>) {
        self.providers.insert(provider.family(), provider);
    }

    pub fn provider_for(&self, datasource_type: DatasourceType) -> Option<&Arc<dyn EvalProvider>> {
        self.providers.get(&datasource_type.family())
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticProvider {
        family: ProviderFamily,
        fingerprints: Vec<String>,
    }

    #[async_trait::async_trait]
    impl EvalProvider for StaticProvider {
        fn family(&self) -> ProviderFamily {
            self.family
        }

        async fn check_health(&self, _instance: &Datasource) -> bool {
            true
        }

        async fn query_fingerprints(
            &self,
            _datasource_id: &str,
            _instance_type: DatasourceType,
            _rule: &AlertRule,
        ) -> Result<Vec<String>> {
            Ok(self.fingerprints.clone())
        }
    }

    #[test]
    fn routes_types_through_their_family() {
        let mut router = ProviderRouter::new();
        router.register(Arc::new(StaticProvider {
            family: ProviderFamily::Metrics,
            fingerprints: vec!["fp1".into()],
        }));
        router.register(Arc::new(StaticProvider {
            family: ProviderFamily::Logs,
            fingerprints: vec![],
        }));

        // Both metrics backends resolve to the same adapter.
        assert!(router.provider_for(DatasourceType::Prometheus).is_some());
        assert!(router.provider_for(DatasourceType::VictoriaMetrics).is_some());
        assert!(router.provider_for(DatasourceType::Loki).is_some());

        // No traces adapter registered.
        assert!(router.provider_for(DatasourceType::Jaeger).is_none());
    }

    #[test]
    fn register_replaces_same_family() {
        let mut router = ProviderRouter::new();
        assert!(router.is_empty());
        router.register(Arc::new(StaticProvider {
            family: ProviderFamily::Metrics,
            fingerprints: vec!["a".into()],
        }));
        router.register(Arc::new(StaticProvider {
            family: ProviderFamily::Metrics,
            fingerprints: vec!["b".into()],
        }));
        assert!(!router.is_empty());
        assert!(router.provider_for(DatasourceType::Prometheus).is_some());
    }
}
