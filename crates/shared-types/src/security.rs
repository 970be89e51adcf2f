//! # One-Hop Envelope Authentication
//!
//! HMAC-SHA256 sealing and verification of [`OneHopEnvelope`]s.
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256**: envelopes are authenticated with a key shared between
//!   adjacent ASes (the one-hop key), never with the hop-field MAC key.
//! - **Time-Bounded Validity**: envelopes expire after [`MAX_AGE`] seconds and
//!   may be at most [`MAX_FUTURE_SKEW`] seconds in the future.
//! - **Constant-Time Comparison**: MAC checks use `verify_slice`.

use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::entities::IsdAs;
use crate::envelope::{EnvelopeVerification, OneHopEnvelope};
use crate::errors::EnvelopeError;

type HmacSha256 = Hmac<Sha256>;

/// Maximum allowed clock skew for future timestamps (seconds).
pub const MAX_FUTURE_SKEW: u64 = 10;

/// Maximum age for valid timestamps (seconds).
pub const MAX_AGE: u64 = 60;

/// Minimum accepted length of a one-hop key.
pub const MIN_KEY_LEN: usize = 16;

fn keyed_mac(key: &[u8]) -> Result<HmacSha256, EnvelopeError> {
    if key.len() < MIN_KEY_LEN {
        return Err(EnvelopeError::InvalidKey(format!(
            "need at least {} bytes, got {}",
            MIN_KEY_LEN,
            key.len()
        )));
    }
    HmacSha256::new_from_slice(key).map_err(|e| EnvelopeError::InvalidKey(e.to_string()))
}

/// Computes the envelope MAC and stores it in `envelope.mac`.
pub fn seal_envelope<T: Serialize>(
    envelope: &mut OneHopEnvelope<T>,
    key: &[u8],
) -> Result<(), EnvelopeError> {
    let mut mac = keyed_mac(key)?;
    mac.update(&envelope.authenticated_bytes()?);
    envelope.mac.copy_from_slice(&mac.finalize().into_bytes());
    Ok(())
}

/// Verifies a received envelope addressed to `local_ia`.
///
/// ## Verification Steps (in order)
///
/// 1. Version
/// 2. Destination
/// 3. Timestamp window
/// 4. MAC
pub fn verify_envelope<T: Serialize>(
    envelope: &OneHopEnvelope<T>,
    local_ia: IsdAs,
    key: &[u8],
    now: u64,
) -> EnvelopeVerification {
    if envelope.version != OneHopEnvelope::<T>::CURRENT_VERSION {
        return EnvelopeVerification::UnsupportedVersion {
            received: envelope.version,
            supported: OneHopEnvelope::<T>::CURRENT_VERSION,
        };
    }

    if envelope.dst_ia != local_ia {
        return EnvelopeVerification::WrongDestination {
            expected: local_ia,
            actual: envelope.dst_ia,
        };
    }

    if let Err(e) = validate_timestamp(envelope.timestamp, now) {
        return e;
    }

    let (mut mac, bytes) = match (keyed_mac(key), envelope.authenticated_bytes()) {
        (Ok(mac), Ok(bytes)) => (mac, bytes),
        _ => return EnvelopeVerification::InvalidMac,
    };
    mac.update(&bytes);
    if mac.verify_slice(&envelope.mac).is_err() {
        return EnvelopeVerification::InvalidMac;
    }

    EnvelopeVerification::Valid
}

/// Validates that `timestamp` lies in `[now - MAX_AGE, now + MAX_FUTURE_SKEW]`.
pub fn validate_timestamp(timestamp: u64, now: u64) -> Result<(), EnvelopeVerification> {
    if timestamp.saturating_add(MAX_AGE) < now
        || timestamp > now.saturating_add(MAX_FUTURE_SKEW)
    {
        return Err(EnvelopeVerification::TimestampOutOfRange { timestamp, now });
    }
    Ok(())
}

/// Returns the current Unix timestamp, or 0 if the clock is before the epoch.
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
