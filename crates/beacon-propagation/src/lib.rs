//! # Beacon Propagation
//!
//! Re-extends received path-segment beacons and forwards them to the
//! neighbors of the local AS, one authenticated one-hop message per link.
//!
//! ## Architecture Role
//!
//! ```text
//! [Beacon Store] ──beacons──→ [Propagator] ──extend + sign──→ [Extender]
//!                                  │
//!                                  ↓ fan-out (bounded, cancellable)
//!                         ┌────────┴────────┐
//!                         ↓                 ↓
//!                    [Neighbor A]      [Neighbor B] ...
//! ```
//!
//! ## Propagation Policy
//!
//! - Beacons arriving on an inactive (or inconsistent) interface are dropped
//! - Core ASes forward on active core links, never back to an AS already on
//!   the segment
//! - Non-core ASes forward on active child links only
//! - One failed extension or send never affects any other task

pub mod adapters;
pub mod cycle;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

pub use cycle::{CancelHandle, CycleContext, CycleReport, FailureKind, TaskFailure};
pub use domain::*;
pub use errors::{ConfigError, ExtendError, ProviderError, SignError, TransportError};
pub use ports::inbound::BeaconPropagationApi;
pub use service::{Propagator, PropagatorBuilder};
