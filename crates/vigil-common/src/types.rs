use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Unit of a rule's evaluation interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvalTimeType {
    #[default]
    Second,
    Millisecond,
}

/// Backend families the dispatcher routes to. Each known
/// [`DatasourceType`] maps into exactly one family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderFamily {
    Metrics,
    Logs,
    Traces,
    CloudMetrics,
    KubernetesEvent,
}

/// The telemetry backends a rule can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasourceType {
    Prometheus,
    VictoriaMetrics,
    AliCloudSLS,
    Loki,
    ElasticSearch,
    VictoriaLogs,
    ClickHouse,
    Jaeger,
    CloudWatch,
    KubernetesEvent,
}

impl DatasourceType {
    /// The adapter family handling this backend.
    pub fn family(self) -> ProviderFamily {
        match self {
            Self::Prometheus | Self::VictoriaMetrics => ProviderFamily::Metrics,
            Self::AliCloudSLS
            | Self::Loki
            | Self::ElasticSearch
            | Self::VictoriaLogs
            | Self::ClickHouse => ProviderFamily::Logs,
            Self::Jaeger => ProviderFamily::Traces,
            Self::CloudWatch => ProviderFamily::CloudMetrics,
            Self::KubernetesEvent => ProviderFamily::KubernetesEvent,
        }
    }
}

impl std::fmt::Display for DatasourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Prometheus => "Prometheus",
            Self::VictoriaMetrics => "VictoriaMetrics",
            Self::AliCloudSLS => "AliCloudSLS",
            Self::Loki => "Loki",
            Self::ElasticSearch => "ElasticSearch",
            Self::VictoriaLogs => "VictoriaLogs",
            Self::ClickHouse => "ClickHouse",
            Self::Jaeger => "Jaeger",
            Self::CloudWatch => "CloudWatch",
            Self::KubernetesEvent => "KubernetesEvent",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for DatasourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Prometheus" => Ok(Self::Prometheus),
            "VictoriaMetrics" => Ok(Self::VictoriaMetrics),
            "AliCloudSLS" => Ok(Self::AliCloudSLS),
            "Loki" => Ok(Self::Loki),
            "ElasticSearch" => Ok(Self::ElasticSearch),
            "VictoriaLogs" => Ok(Self::VictoriaLogs),
            "ClickHouse" => Ok(Self::ClickHouse),
            "Jaeger" => Ok(Self::Jaeger),
            "CloudWatch" => Ok(Self::CloudWatch),
            "KubernetesEvent" => Ok(Self::KubernetesEvent),
            _ => Err(format!("unknown datasource type: {s}")),
        }
    }
}

/// An alert rule as stored in the external catalogue.
///
/// The evaluation core consumes snapshots of this record; only the
/// `enabled` flag is re-read per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    pub tenant_id: String,
    pub rule_id: String,
    pub rule_name: String,
    pub fault_center_id: String,
    pub datasource_type: DatasourceType,
    pub datasource_id_list: Vec<String>,
    pub eval_time_type: EvalTimeType,
    pub eval_interval: i64,
    pub enabled: bool,
}

impl AlertRule {
    /// How long to wait between evaluations. `millisecond` rules tick in
    /// milliseconds; any other unit is treated as seconds.
    pub fn eval_duration(&self) -> Duration {
        let interval = self.eval_interval.max(0) as u64;
        match self.eval_time_type {
            EvalTimeType::Millisecond => Duration::from_millis(interval),
            EvalTimeType::Second => Duration::from_secs(interval),
        }
    }
}

/// A datasource instance a rule queries through an adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datasource {
    pub id: String,
    pub name: String,
    pub datasource_type: DatasourceType,
    pub url: String,
    pub enabled: bool,
}

/// Severity attached to alert events by the upstream producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

/// Lifecycle state of an alert event.
///
/// ```text
/// PreAlert ──▶ Alerting ──▶ PendingRecovery ──▶ Recovered
///                  ▲──────────────┘
/// ```
///
/// `Recovered` is terminal; a `PreAlert` event that stops firing is
/// garbage-collected rather than transitioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    PreAlert,
    Alerting,
    PendingRecovery,
    Recovered,
}

impl EventStatus {
    /// Whether moving from `self` to `next` is a legal edge of the status
    /// machine. Writing the current status again is always allowed so event
    /// upserts stay idempotent.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (EventStatus::PreAlert, EventStatus::Alerting)
                | (EventStatus::Alerting, EventStatus::PendingRecovery)
                | (EventStatus::PendingRecovery, EventStatus::Alerting)
                | (EventStatus::PendingRecovery, EventStatus::Recovered)
        )
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::PreAlert => write!(f, "pre_alert"),
            EventStatus::Alerting => write!(f, "alerting"),
            EventStatus::PendingRecovery => write!(f, "pending_recovery"),
            EventStatus::Recovered => write!(f, "recovered"),
        }
    }
}

/// Rejected status transition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal status transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: EventStatus,
    pub to: EventStatus,
}

/// An alert event as held in the external event cache.
///
/// Uniquely identified by `(tenant_id, fault_center_id, fingerprint)`.
/// `rule_id` may be a composite identifier that *contains* the owning
/// rule's id as a substring; the reconciler scopes by containment, not
/// equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub tenant_id: String,
    pub fault_center_id: String,
    pub fingerprint: String,
    pub rule_id: String,
    pub rule_name: String,
    pub severity: Severity,
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default)]
    pub annotations: String,
    pub status: EventStatus,
    /// Unix seconds of the first observation.
    pub first_trigger_time: i64,
    /// Unix seconds of the most recent evaluation that touched this event.
    pub last_eval_time: i64,
    /// Unix seconds at which the event was declared recovered; zero until then.
    pub recover_time: i64,
}

impl AlertEvent {
    /// Moves the event to `next`, rejecting edges outside the status machine.
    pub fn transition(&mut self, next: EventStatus) -> Result<(), InvalidTransition> {
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}

/// Recovery policy of a fault center. `recover_wait_time` is the hysteresis
/// window in seconds; the core coerces zero to one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FaultCenterInfo {
    pub recover_wait_time: i64,
}
