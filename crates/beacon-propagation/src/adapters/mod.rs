//! Concrete implementations of the outbound ports.

pub mod ifstate;
pub mod onehop;
pub mod provider;
pub mod signer;

pub use ifstate::Interfaces;
pub use onehop::{decode_datagram, BeaconMessage, OneHopSender};
pub use provider::MemoryBeaconProvider;
pub use signer::KeySigner;
