//! # Shared Types Crate
//!
//! Identifier types and the one-hop message envelope shared by the beacon
//! server's subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: ISD, AS and interface identifiers are defined
//!   here and nowhere else.
//! - **Envelope Integrity**: every one-hop control message travels inside a
//!   `OneHopEnvelope<T>` authenticated with HMAC-SHA256.
//! - **Text Round-Trip**: identifiers parse from and print to the canonical
//!   `<isd>-<as>` notation used in topology files and logs.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod security;

pub use entities::*;
pub use envelope::{EnvelopeVerification, OneHopEnvelope};
pub use errors::*;
pub use security::*;
