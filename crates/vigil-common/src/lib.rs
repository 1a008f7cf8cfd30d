//! Shared data model for the vigil alert evaluation engine.
//!
//! Rules, datasources, alert events and the event status machine live here,
//! together with the cache-key builders used to address the external event
//! cache. Everything is plain data; behavior belongs to the evaluation core.

pub mod keys;
pub mod types;
