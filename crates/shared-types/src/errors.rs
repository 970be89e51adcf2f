//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Errors raised while parsing or constructing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// AS number does not fit in 48 bits.
    #[error("AS number out of range: {0}")]
    AsOutOfRange(u64),

    /// AS text is neither decimal (BGP range) nor `hhhh:hhhh:hhhh`.
    #[error("Malformed AS identifier: {0:?}")]
    MalformedAs(String),

    /// ISD-AS text is not of the form `<isd>-<as>`.
    #[error("Malformed ISD-AS identifier: {0:?}")]
    MalformedIsdAs(String),
}

/// Errors related to one-hop envelope handling.
#[derive(Debug, Clone, Error)]
pub enum EnvelopeError {
    /// Payload could not be encoded or decoded.
    #[error("Envelope codec error: {0}")]
    Codec(String),

    /// Authentication key is unusable.
    #[error("Invalid envelope key: {0}")]
    InvalidKey(String),
}

impl From<bincode::Error> for EnvelopeError {
    fn from(err: bincode::Error) -> Self {
        EnvelopeError::Codec(err.to_string())
    }
}
