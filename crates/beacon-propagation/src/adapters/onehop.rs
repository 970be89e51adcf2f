//! UDP one-hop sender.
//!
//! Each extended beacon travels in its own datagram: a bincode-encoded
//! [`OneHopEnvelope`] sealed with the one-hop key shared with the neighbor.

use async_trait::async_trait;
use shared_types::{current_timestamp, seal_envelope, IsdAs, OneHopEnvelope};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::trace;
use zeroize::Zeroizing;

use crate::domain::{ExtendedBeacon, PathSegment};
use crate::errors::TransportError;
use crate::ports::outbound::{BeaconSender, Destination};

/// Largest UDP payload over IPv4.
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// A beacon as received from a neighbor.
pub type BeaconMessage = OneHopEnvelope<PathSegment>;

/// Sends beacons as authenticated one-hop datagrams.
pub struct OneHopSender {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
    local_ia: IsdAs,
    key: Zeroizing<Vec<u8>>,
    send_timeout: Duration,
}

impl OneHopSender {
    /// Binds the sending socket.
    pub async fn bind(addr: SocketAddr, local_ia: IsdAs, key: Vec<u8>) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr).await?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket: Arc::new(socket),
            local_addr,
            local_ia,
            key: Zeroizing::new(key),
            send_timeout: Duration::from_secs(1),
        })
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn encode(&self, beacon: &ExtendedBeacon, dst: &Destination) -> Result<Vec<u8>, TransportError> {
        let mut envelope = OneHopEnvelope::new(
            self.local_ia,
            dst.ia,
            dst.ifid,
            current_timestamp(),
            &*beacon.segment,
        );
        seal_envelope(&mut envelope, &self.key)?;
        let bytes = bincode::serialize(&envelope)?;
        if bytes.len() > MAX_DATAGRAM_SIZE {
            return Err(TransportError::Oversized {
                size: bytes.len(),
                max: MAX_DATAGRAM_SIZE,
            });
        }
        Ok(bytes)
    }
}

#[async_trait]
impl BeaconSender for OneHopSender {
    async fn send(&self, beacon: &ExtendedBeacon, dst: &Destination) -> Result<(), TransportError> {
        let bytes = self.encode(beacon, dst)?;
        tokio::time::timeout(self.send_timeout, self.socket.send_to(&bytes, dst.addr))
            .await
            .map_err(|_| TransportError::Timeout)??;
        trace!(dst_ia = %dst.ia, egress = %dst.ifid, len = bytes.len(), "Beacon datagram sent");
        Ok(())
    }
}

/// Decodes a received datagram. Authenticity is checked separately with
/// [`shared_types::verify_envelope`].
pub fn decode_datagram(bytes: &[u8]) -> Result<BeaconMessage, TransportError> {
    Ok(bincode::deserialize(bytes)?)
}
