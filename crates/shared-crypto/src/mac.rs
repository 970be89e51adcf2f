//! # Hop-Field MAC
//!
//! HMAC-SHA256 truncated to [`HOP_MAC_LEN`] bytes, used to authenticate the
//! static fields of every hop an AS adds to a path segment.
//!
//! ## Security Properties
//!
//! - The key is an opaque symmetric secret supplied by configuration
//! - Raw key bytes are wiped once the HMAC state is derived
//! - Verification compares truncated tags in constant time

use crate::CryptoError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroize;

type HmacSha256 = Hmac<Sha256>;

/// Length of a truncated hop MAC in bytes.
pub const HOP_MAC_LEN: usize = 6;

/// Accepted key sizes in bytes.
const MIN_KEY_LEN: usize = 16;
const MAX_KEY_LEN: usize = 64;

/// Keyed hop MAC state.
#[derive(Clone)]
pub struct HopMacKey {
    inner: HmacSha256,
}

impl HopMacKey {
    /// Keys the MAC with `bytes` and wipes the input buffer.
    pub fn new(mut bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let len = bytes.len();
        if !(MIN_KEY_LEN..=MAX_KEY_LEN).contains(&len) {
            bytes.zeroize();
            return Err(CryptoError::InvalidKeyLength {
                min: MIN_KEY_LEN,
                max: MAX_KEY_LEN,
                actual: len,
            });
        }
        let inner = HmacSha256::new_from_slice(&bytes).map_err(|_| {
            CryptoError::InvalidKeyLength {
                min: MIN_KEY_LEN,
                max: MAX_KEY_LEN,
                actual: len,
            }
        });
        bytes.zeroize();
        Ok(Self { inner: inner? })
    }

    /// Computes the truncated tag over the concatenation of `parts`.
    pub fn tag(&self, parts: &[&[u8]]) -> [u8; HOP_MAC_LEN] {
        let mut mac = self.inner.clone();
        for part in parts {
            mac.update(part);
        }
        let full = mac.finalize().into_bytes();
        let mut out = [0u8; HOP_MAC_LEN];
        out.copy_from_slice(&full[..HOP_MAC_LEN]);
        out
    }

    /// Checks `tag` against the concatenation of `parts`.
    pub fn verify(&self, parts: &[&[u8]], tag: &[u8]) -> bool {
        let mut mac = self.inner.clone();
        for part in parts {
            mac.update(part);
        }
        tag.len() == HOP_MAC_LEN && mac.verify_truncated_left(tag).is_ok()
    }
}

impl std::fmt::Debug for HopMacKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HopMacKey(<redacted>)")
    }
}
