//! Reconciliation - the safety net under the event-driven paths
//!
//! Two periodic passes re-derive what the live paths should have written
//! and repair any drift: the billing pass re-runs the charge calculator
//! for every checked-in guest and appends whatever is missing from their
//! bill, and the cleaning sweep releases rooms whose dwell elapsed but
//! whose one-shot timer never fired (a crashed process loses its timers).
//! Both passes are idempotent, so overlapping with the live path is
//! harmless.

pub mod scheduler;

pub use scheduler::{
    BillingReport, ReconciliationScheduler, SchedulerConfig, SweepReport, TaskHandle,
};
