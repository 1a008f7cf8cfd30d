use std::sync::Arc;

use vigil_provider::ProviderRouter;
use vigil_store::{
    DatasourceStore, EventStore, FaultCenterStore, PendingRecoveryStore, RuleStore,
};

/// Everything a rule evaluation needs, bundled for cheap sharing across
/// the per-rule tasks.
pub struct EvalContext {
    pub events: Arc<dyn EventStore>,
    pub pending: Arc<dyn PendingRecoveryStore>,
    pub fault_centers: Arc<dyn FaultCenterStore>,
    pub rules: Arc<dyn RuleStore>,
    pub datasources: Arc<dyn DatasourceStore>,
    pub providers: ProviderRouter,
}
