//! # AS Signing Keys
//!
//! Ed25519 keys used by an AS to sign the path segments it extends.
//!
//! A signing key carries the end of its validity period (`not_after`, unix
//! seconds). Hop fields created with the key must not outlive it.

use crate::CryptoError;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Public half of an AS signing key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsVerifyingKey(VerifyingKey);

impl AsVerifyingKey {
    /// Parses a 32-byte compressed Edwards point.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes)
            .map(Self)
            .map_err(|_| CryptoError::InvalidPublicKey)
    }

    /// Raw key bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Verifies an opaque signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let bytes: [u8; SIGNATURE_LEN] =
            signature
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureFormat {
                    expected: SIGNATURE_LEN,
                    actual: signature.len(),
                })?;
        self.0
            .verify(message, &Signature::from_bytes(&bytes))
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

/// Ed25519 signing key of an AS, with its validity end.
///
/// The inner key is zeroized on drop by `ed25519-dalek`.
pub struct AsSigningKey {
    key: SigningKey,
    not_after: u64,
}

impl AsSigningKey {
    /// Generates a random key valid until `not_after`.
    pub fn generate(not_after: u64) -> Self {
        Self {
            key: SigningKey::generate(&mut rand::thread_rng()),
            not_after,
        }
    }

    /// Derives the key from a 32-byte secret seed.
    pub fn from_seed(seed: [u8; 32], not_after: u64) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
            not_after,
        }
    }

    /// Unix time (seconds) after which signatures of this key are no longer valid.
    pub fn not_after(&self) -> u64 {
        self.not_after
    }

    /// Public half of this key.
    pub fn verifying_key(&self) -> AsVerifyingKey {
        AsVerifyingKey(self.key.verifying_key())
    }

    /// Signs `message` (deterministic, no RNG).
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        self.key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for AsSigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsSigningKey")
            .field("verifying_key", &self.verifying_key())
            .field("not_after", &self.not_after)
            .finish()
    }
}
