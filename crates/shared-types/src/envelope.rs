//! # `OneHopEnvelope`
//!
//! The wrapper for control messages sent directly to an adjacent AS, without
//! an established path.
//!
//! ## Security Properties
//!
//! - **Versioning**: all envelopes carry a `version` field.
//! - **Link Binding**: source, destination and the sender's egress interface
//!   are covered by the MAC, so a message cannot be replayed on another link.
//! - **Time-Bounded Replay Prevention**: `timestamp` + `nonce`.
//! - **Authentication**: HMAC-SHA256 over header and payload with a key that
//!   is distinct from the per-hop MAC key of path segments.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{IfId, IsdAs};
use crate::errors::EnvelopeError;

/// Envelope for a one-hop control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHopEnvelope<T> {
    /// Protocol version for forward compatibility.
    pub version: u16,
    /// Sending AS.
    pub src_ia: IsdAs,
    /// Receiving (adjacent) AS.
    pub dst_ia: IsdAs,
    /// Interface of the sending AS the message leaves through.
    pub egress: IfId,
    /// Unix timestamp (seconds) at which the envelope was sealed.
    pub timestamp: u64,
    /// Unique nonce for replay prevention within the timestamp window.
    pub nonce: Uuid,
    /// HMAC-SHA256 over every other field.
    pub mac: [u8; 32],
    /// The carried message.
    pub payload: T,
}

/// Borrowed view of the authenticated part of an envelope.
#[derive(Serialize)]
struct AuthenticatedFields<'a, T> {
    version: u16,
    src_ia: &'a IsdAs,
    dst_ia: &'a IsdAs,
    egress: IfId,
    timestamp: u64,
    nonce: &'a Uuid,
    payload: &'a T,
}

impl<T> OneHopEnvelope<T> {
    /// Current protocol version.
    pub const CURRENT_VERSION: u16 = 1;

    /// Creates an unsealed envelope (zero MAC) for `payload`.
    pub fn new(src_ia: IsdAs, dst_ia: IsdAs, egress: IfId, timestamp: u64, payload: T) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            src_ia,
            dst_ia,
            egress,
            timestamp,
            nonce: Uuid::new_v4(),
            mac: [0u8; 32],
            payload,
        }
    }
}

impl<T: Serialize> OneHopEnvelope<T> {
    /// Canonical bytes covered by the MAC.
    pub fn authenticated_bytes(&self) -> Result<Vec<u8>, EnvelopeError> {
        let view = AuthenticatedFields {
            version: self.version,
            src_ia: &self.src_ia,
            dst_ia: &self.dst_ia,
            egress: self.egress,
            timestamp: self.timestamp,
            nonce: &self.nonce,
            payload: &self.payload,
        };
        Ok(bincode::serialize(&view)?)
    }
}

/// Result of envelope verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeVerification {
    /// Envelope passed all checks.
    Valid,
    /// Envelope version is unsupported.
    UnsupportedVersion { received: u16, supported: u16 },
    /// Envelope timestamp is outside the valid window.
    TimestampOutOfRange { timestamp: u64, now: u64 },
    /// Envelope is addressed to another AS.
    WrongDestination { expected: IsdAs, actual: IsdAs },
    /// MAC does not match.
    InvalidMac,
}

impl EnvelopeVerification {
    /// Returns true if the verification was successful.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, EnvelopeVerification::Valid)
    }
}
