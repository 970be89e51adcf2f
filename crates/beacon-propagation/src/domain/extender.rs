//! Beacon extension: appends the local hop entry, authenticates it with the
//! hop MAC, signs the result and enforces the MTU bound.
//!
//! ## Hop MAC input
//!
//! ```text
//! ia (8) ‖ ingress (8) ‖ egress (8) ‖ exp_time (1) ‖ timestamp (4) ‖ prev MAC (0 or 6)
//! ```
//!
//! All integers big-endian. Chaining to the previous MAC binds each hop to
//! the path it was added to.

use shared_crypto::{AsVerifyingKey, CryptoError, HopMacKey, HOP_MAC_LEN};
use shared_types::{IfId, IsdAs};

use super::invariants::invariant_size_limit;
use super::{
    Beacon, ExpTime, ExtendedBeacon, HopEntry, Interface, PathSegment, PeerEntry,
    PropagationConfig, SegmentInfo,
};
use crate::errors::ExtendError;
use crate::ports::outbound::BeaconSigner;

/// Extends beacons on behalf of the local AS.
#[derive(Clone, Debug)]
pub struct Extender {
    local_ia: IsdAs,
    mtu: u16,
    max_exp_time: ExpTime,
    mac_key: HopMacKey,
}

impl Extender {
    pub fn new(local_ia: IsdAs, mtu: u16, max_exp_time: ExpTime, mac_key: HopMacKey) -> Self {
        Self {
            local_ia,
            mtu,
            max_exp_time,
            mac_key,
        }
    }

    pub fn from_config(config: &PropagationConfig, mac_key: HopMacKey) -> Self {
        Self::new(config.local_ia, config.mtu, config.max_exp_time, mac_key)
    }

    /// Extends `beacon` towards `egress`.
    ///
    /// `peers` are the local peering interfaces; each active one contributes
    /// a peer entry. The input beacon is never modified.
    pub fn extend(
        &self,
        beacon: &Beacon,
        egress: &Interface,
        peers: &[Interface],
        signer: &dyn BeaconSigner,
    ) -> Result<ExtendedBeacon, ExtendError> {
        if !egress.is_active() {
            return Err(ExtendError::InactiveEgress(egress.ifid));
        }

        let info = beacon.segment.info;
        let exp_time = self.exp_time(info.timestamp, signer.expires_at())?;
        let prev_mac = beacon.segment.last_entry().map(|e| e.mac);

        let peers = peers
            .iter()
            .filter_map(|peer| {
                let peer_ifid = peer.remote_ifid()?;
                Some(PeerEntry {
                    peer_ia: peer.remote_ia,
                    peer_ifid,
                    ingress: peer.ifid,
                    egress: egress.ifid,
                    exp_time,
                    mac: hop_mac(
                        &self.mac_key,
                        self.local_ia,
                        peer.ifid,
                        egress.ifid,
                        exp_time,
                        &info,
                        prev_mac.as_ref(),
                    ),
                })
            })
            .collect();

        let mut entries = Vec::with_capacity(beacon.segment.entries.len() + 1);
        entries.extend_from_slice(&beacon.segment.entries);
        entries.push(HopEntry {
            ia: self.local_ia,
            ingress: beacon.ingress,
            egress: egress.ifid,
            exp_time,
            mtu: self.mtu,
            mac: hop_mac(
                &self.mac_key,
                self.local_ia,
                beacon.ingress,
                egress.ifid,
                exp_time,
                &info,
                prev_mac.as_ref(),
            ),
            peers,
            signature: Vec::new(),
        });

        let signature = signer.sign(&signing_input(&info, &entries)?)?;
        if let Some(last) = entries.last_mut() {
            last.signature = signature;
        }

        let segment = PathSegment { info, entries };
        let encoded_len = segment.encoded_len()?;
        if !invariant_size_limit(encoded_len, self.mtu) {
            return Err(ExtendError::SizeExceeded {
                size: encoded_len,
                max: usize::from(self.mtu),
            });
        }

        Ok(ExtendedBeacon {
            source: beacon.id(),
            segment: segment.into(),
            egress: egress.ifid,
            encoded_len,
        })
    }

    /// Configured maximum, capped so the hop does not outlive the signer.
    fn exp_time(&self, timestamp: u32, expires_at: u64) -> Result<ExpTime, ExtendError> {
        let validity = expires_at
            .checked_sub(u64::from(timestamp))
            .and_then(ExpTime::max_within)
            .ok_or(ExtendError::SignerExpired {
                expires_at,
                timestamp,
            })?;
        Ok(validity.min(self.max_exp_time))
    }
}

/// Bytes covered by a hop entry's signature: segment info plus all entries
/// up to and including the signed one, whose own signature is empty.
pub fn signing_input(info: &SegmentInfo, entries: &[HopEntry]) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(&(info, entries))
}

/// Computes a truncated hop MAC.
pub fn hop_mac(
    key: &HopMacKey,
    ia: IsdAs,
    ingress: IfId,
    egress: IfId,
    exp_time: ExpTime,
    info: &SegmentInfo,
    prev_mac: Option<&[u8; HOP_MAC_LEN]>,
) -> [u8; HOP_MAC_LEN] {
    key.tag(&[&mac_input(ia, ingress, egress, exp_time, info, prev_mac)])
}

fn mac_input(
    ia: IsdAs,
    ingress: IfId,
    egress: IfId,
    exp_time: ExpTime,
    info: &SegmentInfo,
    prev_mac: Option<&[u8; HOP_MAC_LEN]>,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(29 + HOP_MAC_LEN);
    buf.extend_from_slice(&ia.to_bytes());
    buf.extend_from_slice(&ingress.0.to_be_bytes());
    buf.extend_from_slice(&egress.0.to_be_bytes());
    buf.push(exp_time.0);
    buf.extend_from_slice(&info.timestamp.to_be_bytes());
    if let Some(prev) = prev_mac {
        buf.extend_from_slice(prev);
    }
    buf
}

/// Checks the hop MAC of `segment.entries[index]` and of its peer entries.
pub fn verify_hop_mac(key: &HopMacKey, segment: &PathSegment, index: usize) -> bool {
    let Some(entry) = segment.entries.get(index) else {
        return false;
    };
    let prev = index
        .checked_sub(1)
        .and_then(|i| segment.entries.get(i))
        .map(|e| e.mac);
    let check = |ingress: IfId, egress: IfId, exp_time: ExpTime, mac: &[u8]| {
        let input = mac_input(entry.ia, ingress, egress, exp_time, &segment.info, prev.as_ref());
        key.verify(&[&input], mac)
    };
    check(entry.ingress, entry.egress, entry.exp_time, &entry.mac)
        && entry
            .peers
            .iter()
            .all(|peer| check(peer.ingress, peer.egress, peer.exp_time, &peer.mac))
}

/// Checks the AS signature of `segment.entries[index]`.
pub fn verify_entry_signature(
    key: &AsVerifyingKey,
    segment: &PathSegment,
    index: usize,
) -> Result<(), CryptoError> {
    let Some(entry) = segment.entries.get(index) else {
        return Err(CryptoError::SignatureVerificationFailed);
    };
    let mut signed = segment.entries[..=index].to_vec();
    if let Some(last) = signed.last_mut() {
        last.signature = Vec::new();
    }
    let input = signing_input(&segment.info, &signed)
        .map_err(|_| CryptoError::SignatureVerificationFailed)?;
    key.verify(&input, &entry.signature)
}
