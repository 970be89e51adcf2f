//! Outbound ports (SPI) for beacon propagation.

use async_trait::async_trait;
use futures::stream::BoxStream;
use shared_types::{IfId, IsdAs};
use std::net::SocketAddr;

use crate::domain::{Beacon, ExtendedBeacon, InterfaceSnapshot};
use crate::errors::{ProviderError, SignError, TransportError};

/// Lazy, finite sequence of candidate beacons for one cycle.
///
/// An `Err` item is a retrieval fault for that item only.
pub type BeaconStream = BoxStream<'static, Result<Beacon, ProviderError>>;

/// Source of beacons to propagate (usually backed by the beacon store).
#[async_trait]
pub trait BeaconProvider: Send + Sync {
    /// Opens the candidate sequence for the current cycle.
    async fn beacons_to_propagate(&self) -> Result<BeaconStream, ProviderError>;
}

/// Read-only access to the local interfaces.
pub trait InterfaceRegistry: Send + Sync {
    /// Point-in-time view. Taken once per cycle.
    fn snapshot(&self) -> InterfaceSnapshot;
}

/// AS-level signer.
pub trait BeaconSigner: Send + Sync {
    /// AS the signing key belongs to.
    fn ia(&self) -> IsdAs;

    /// Unix time (seconds) at which the signing key stops being valid.
    fn expires_at(&self) -> u64;

    /// Signs `message`. The signature is opaque to the propagator.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError>;
}

/// Where an extended beacon is delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Destination {
    /// Neighbor AS.
    pub ia: IsdAs,
    /// Local egress interface.
    pub ifid: IfId,
    /// Interface id on the neighbor's side of the link.
    pub remote_ifid: IfId,
    /// Neighbor's control service address.
    pub addr: SocketAddr,
}

/// One-hop message transport.
///
/// Implementations frame and authenticate the message themselves. The
/// propagator never retries a failed send.
#[async_trait]
pub trait BeaconSender: Send + Sync {
    async fn send(&self, beacon: &ExtendedBeacon, dst: &Destination) -> Result<(), TransportError>;
}
