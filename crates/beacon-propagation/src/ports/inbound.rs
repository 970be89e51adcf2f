//! Inbound ports (API) for beacon propagation.

use async_trait::async_trait;

use crate::cycle::{CycleContext, CycleReport};

/// Primary API for beacon propagation.
///
/// Scheduling is external: the caller decides when a cycle runs and supplies
/// its cancellation signal and deadline.
#[async_trait]
pub trait BeaconPropagationApi: Send + Sync {
    /// Runs one propagation cycle.
    ///
    /// Never fails as a whole. Per-beacon and per-task faults are aggregated
    /// in the returned report.
    async fn run_cycle(&self, ctx: CycleContext) -> CycleReport;
}
