//! Cache-key builders for the external event cache.
//!
//! Keys are opaque to the stores that consume them; the format is an
//! internal convention of this crate. Events and fault-center info are
//! addressed per `(tenant, fault_center)`; pending-recovery entries are
//! keyed per `(tenant, rule)` inside the pending store itself.

use std::fmt;

/// Key addressing the set of alert events of one fault center.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertEventCacheKey(String);

impl AlertEventCacheKey {
    pub fn new(tenant_id: &str, fault_center_id: &str) -> Self {
        Self(format!("{tenant_id}:fault-center:{fault_center_id}:events"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertEventCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key addressing a fault center's recovery policy record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaultCenterInfoCacheKey(String);

impl FaultCenterInfoCacheKey {
    pub fn new(tenant_id: &str, fault_center_id: &str) -> Self {
        Self(format!("{tenant_id}:fault-center:{fault_center_id}:info"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FaultCenterInfoCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_key_embeds_tenant_and_fault_center() {
        let key = AlertEventCacheKey::new("acme", "fc-7");
        assert_eq!(key.as_str(), "acme:fault-center:fc-7:events");
    }

    #[test]
    fn info_key_differs_from_event_key() {
        let events = AlertEventCacheKey::new("acme", "fc-7");
        let info = FaultCenterInfoCacheKey::new("acme", "fc-7");
        assert_ne!(events.as_str(), info.as_str());
    }
}
