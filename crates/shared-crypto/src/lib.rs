//! # Shared Crypto - Control Plane Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `signatures` | Ed25519 | AS-level signatures over path segments |
//! | `mac` | HMAC-SHA256 (truncated) | Per-hop authentication of hop fields |
//! | `hashing` | BLAKE3 | Segment identifiers |
//!
//! ## Security Properties
//!
//! - **Ed25519**: deterministic nonces, signing key zeroized on drop
//! - **Hop MAC**: keyed once at construction, raw key bytes wiped afterwards,
//!   tags compared in constant time
//! - **BLAKE3**: used for identifiers only, never for authentication

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod mac;
pub mod signatures;

pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, Hash};
pub use mac::{HopMacKey, HOP_MAC_LEN};
pub use signatures::{AsSigningKey, AsVerifyingKey, SIGNATURE_LEN};
