//! Error types for beacon propagation.
//!
//! Only [`ConfigError`] is fatal. Every other error is scoped to a single
//! beacon or a single (beacon, egress) task and ends up in the cycle report.

use shared_types::{IfId, IsdAs};
use thiserror::Error;

/// Construction-time errors. The propagator refuses to start on any of these.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No signer configured")]
    MissingSigner,

    #[error("No hop MAC key configured")]
    MissingMacKey,

    #[error("No interface registry configured")]
    MissingRegistry,

    #[error("No beacon provider configured")]
    MissingProvider,

    #[error("No beacon sender configured")]
    MissingSender,

    #[error("Local ISD-AS must not be a wildcard: {0}")]
    InvalidLocalIa(IsdAs),

    #[error("MTU too small: {mtu} (min: {min})")]
    InvalidMtu { mtu: u16, min: u16 },

    #[error("max_concurrent_sends must be at least 1")]
    InvalidConcurrency,

    #[error("Interface set is empty")]
    EmptyInterfaceSet,

    #[error("Interface {0} defined more than once")]
    DuplicateInterface(IfId),

    #[error("Interface {0} links the local AS to itself")]
    SelfLink(IfId),

    #[error("Signer belongs to {actual}, expected {expected}")]
    SignerMismatch { expected: IsdAs, actual: IsdAs },
}

/// Signer failures, reported by [`crate::ports::outbound::BeaconSigner`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignError {
    #[error("Signing key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("Signing failed: {0}")]
    Failed(String),
}

/// Failure to extend one beacon towards one egress interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtendError {
    #[error("Signer expires at {expires_at}, too early for segment timestamp {timestamp}")]
    SignerExpired { expires_at: u64, timestamp: u32 },

    #[error("Extended segment too large: {size} bytes (max: {max})")]
    SizeExceeded { size: usize, max: usize },

    #[error("Egress interface {0} has no active remote")]
    InactiveEgress(IfId),

    #[error("Segment encoding failed: {0}")]
    Codec(String),

    #[error(transparent)]
    Sign(#[from] SignError),
}

impl From<bincode::Error> for ExtendError {
    fn from(err: bincode::Error) -> Self {
        ExtendError::Codec(err.to_string())
    }
}

/// Failure to deliver one extended beacon to one neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Message encoding failed: {0}")]
    Codec(String),

    #[error("Envelope error: {0}")]
    Envelope(String),

    #[error("Datagram too large: {size} bytes (max: {max})")]
    Oversized { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Send timed out")]
    Timeout,
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        TransportError::Io(err.to_string())
    }
}

impl From<bincode::Error> for TransportError {
    fn from(err: bincode::Error) -> Self {
        TransportError::Codec(err.to_string())
    }
}

impl From<shared_types::EnvelopeError> for TransportError {
    fn from(err: shared_types::EnvelopeError) -> Self {
        TransportError::Envelope(err.to_string())
    }
}

/// Beacon source failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Beacon source unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed beacon: {0}")]
    Malformed(String),
}
