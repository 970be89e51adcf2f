//! Ports for beacon propagation (hexagonal boundary).

pub mod inbound;
pub mod outbound;
