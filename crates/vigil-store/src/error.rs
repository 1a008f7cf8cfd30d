/// Errors surfaced by store implementations.
///
/// `NotFound` covers records that are absent by identity (a rule or
/// datasource id that does not exist). Key absence in the pending-recovery
/// table is *not* an error: [`crate::PendingRecoveryStore::get`] returns
/// `Ok(None)`, so callers can tell "missing" from "the backend failed".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store: {entity} not found (key={key})")]
    NotFound { entity: &'static str, key: String },

    /// An underlying cache or database client error.
    #[error("store: backend error: {0}")]
    Backend(#[source] anyhow::Error),

    #[error("store: {0}")]
    Other(String),
}

/// Convenience `Result` alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
