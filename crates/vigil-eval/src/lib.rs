//! Rule evaluation scheduler and recovery state machine.
//!
//! The [`scheduler::EvalScheduler`] owns one long-lived task per submitted
//! rule. Each task ticks on the rule's evaluation interval, queries the
//! rule's datasources through the registered family adapters, and hands the
//! resulting fingerprint set to the reconciler, which drives stored alert
//! events through `PreAlert → Alerting → PendingRecovery → Recovered` with
//! a fault-center-configurable hysteresis window before recovery is
//! declared.
//!
//! All durable state lives behind the [`vigil_store`] traits; the scheduler
//! itself only tracks which rules are running.

pub mod context;
pub mod scheduler;

mod dispatch;
mod recover;


pub use context::EvalContext;
pub use scheduler::EvalScheduler;
