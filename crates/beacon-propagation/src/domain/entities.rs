//! Core domain entities: path segments, beacons and local interfaces.

use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash_many, HOP_MAC_LEN};
use shared_types::{IfId, Isd, IsdAs, LinkRole};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use super::invariants::{check_segment, InvariantViolation};

/// Origin information of a path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentInfo {
    /// Origination time (unix seconds). Hop expiry is relative to it.
    pub timestamp: u32,
    /// Random identifier chosen by the origin AS.
    pub segment_id: u16,
}

/// Relative hop expiry, in units of 24h / 256 (337.5 s).
///
/// The encoded value `e` stands for a lifetime of `(e + 1) * 337.5 s`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpTime(pub u8);

impl ExpTime {
    /// Length of one expiry unit in milliseconds.
    pub const UNIT_MILLIS: u64 = 337_500;

    /// 24 hours.
    pub const MAX: ExpTime = ExpTime(u8::MAX);

    /// Lifetime in whole seconds (rounded down).
    pub fn lifetime_secs(&self) -> u64 {
        (u64::from(self.0) + 1) * Self::UNIT_MILLIS / 1000
    }

    /// Largest expiry whose lifetime does not exceed `secs`.
    ///
    /// Returns `None` if even the shortest lifetime is too long.
    pub fn max_within(secs: u64) -> Option<ExpTime> {
        let units = secs.saturating_mul(1000) / Self::UNIT_MILLIS;
        if units == 0 {
            return None;
        }
        Some(ExpTime((units - 1).min(u64::from(u8::MAX)) as u8))
    }
}

impl Default for ExpTime {
    /// Six hours.
    fn default() -> Self {
        ExpTime(63)
    }
}

/// Shortcut hop recorded for a peering link of the extending AS.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerEntry {
    /// AS on the other side of the peering link.
    pub peer_ia: IsdAs,
    /// Interface id of the peering link as seen by the peer.
    pub peer_ifid: IfId,
    /// Local peering interface (the shortcut's ingress).
    pub ingress: IfId,
    /// Same egress as the enclosing hop entry.
    pub egress: IfId,
    pub exp_time: ExpTime,
    pub mac: [u8; HOP_MAC_LEN],
}

/// One AS's contribution to a path segment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopEntry {
    pub ia: IsdAs,
    /// Interface the segment entered this AS through (`NONE` at the origin).
    pub ingress: IfId,
    /// Interface the segment left this AS through.
    pub egress: IfId,
    pub exp_time: ExpTime,
    /// Segment MTU advertised by this AS.
    pub mtu: u16,
    /// Truncated hop MAC, chained to the previous entry's MAC.
    pub mac: [u8; HOP_MAC_LEN],
    pub peers: Vec<PeerEntry>,
    /// AS signature over the segment info and all entries up to this one.
    pub signature: Vec<u8>,
}

/// A path segment: origin info plus the ordered hop entries (origin first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathSegment {
    pub info: SegmentInfo,
    pub entries: Vec<HopEntry>,
}

impl PathSegment {
    /// Most recent hop entry.
    pub fn last_entry(&self) -> Option<&HopEntry> {
        self.entries.last()
    }

    /// True if `ia` already appears on the segment.
    pub fn contains_ia(&self, ia: IsdAs) -> bool {
        self.entries.iter().any(|e| e.ia == ia)
    }

    /// ISD of every hop, in path order.
    pub fn isds(&self) -> impl Iterator<Item = Isd> + '_ {
        self.entries.iter().map(|e| e.ia.isd)
    }

    /// Size of the canonical (bincode) encoding.
    pub fn encoded_len(&self) -> Result<usize, bincode::Error> {
        bincode::serialized_size(self).map(|n| n as usize)
    }

    /// Stable identifier over the static fields (ignores MACs and signatures).
    pub fn id(&self) -> BeaconId {
        let mut header = [0u8; 6];
        header[..4].copy_from_slice(&self.info.timestamp.to_be_bytes());
        header[4..].copy_from_slice(&self.info.segment_id.to_be_bytes());
        let mut hops = Vec::with_capacity(self.entries.len() * 24);
        for entry in &self.entries {
            hops.extend_from_slice(&entry.ia.to_bytes());
            hops.extend_from_slice(&entry.ingress.0.to_be_bytes());
            hops.extend_from_slice(&entry.egress.0.to_be_bytes());
        }
        BeaconId(blake3_hash_many(&[&header, &hops]))
    }
}

/// Digest identifying a segment in logs and reports.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BeaconId(pub shared_crypto::Hash);

impl fmt::Display for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0[..8] {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for BeaconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BeaconId({})", self)
    }
}

/// A candidate segment together with the local interface it arrived on.
///
/// Immutable. Extension always produces a new segment.
#[derive(Clone, Debug)]
pub struct Beacon {
    pub segment: Arc<PathSegment>,
    pub ingress: IfId,
}

impl Beacon {
    /// Wraps a received segment, rejecting empty or looping segments.
    pub fn new(segment: PathSegment, ingress: IfId) -> Result<Self, InvariantViolation> {
        check_segment(&segment)?;
        Ok(Self {
            segment: Arc::new(segment),
            ingress,
        })
    }

    pub fn id(&self) -> BeaconId {
        self.segment.id()
    }

    /// AS of the most recent hop, i.e. the neighbor the beacon came from.
    pub fn last_ia(&self) -> Option<IsdAs> {
        self.segment.last_entry().map(|e| e.ia)
    }
}

/// Result of extending a beacon towards one egress interface.
#[derive(Clone, Debug)]
pub struct ExtendedBeacon {
    /// Identifier of the beacon this was extended from.
    pub source: BeaconId,
    pub segment: Arc<PathSegment>,
    pub egress: IfId,
    /// Size of the canonical encoding of `segment`.
    pub encoded_len: usize,
}

/// Activation state of a local interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Inactive,
    /// Link is up; `remote_ifid` is the interface id on the neighbor's side.
    Active { remote_ifid: IfId },
}

/// A local interface and the neighbor it leads to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub ifid: IfId,
    pub role: LinkRole,
    pub remote_ia: IsdAs,
    /// Underlay address of the neighbor's control service.
    pub remote_addr: SocketAddr,
    pub activation: Activation,
}

impl Interface {
    pub fn is_active(&self) -> bool {
        matches!(self.activation, Activation::Active { .. })
    }

    /// Neighbor-side interface id, if the link is active.
    pub fn remote_ifid(&self) -> Option<IfId> {
        match self.activation {
            Activation::Active { remote_ifid } => Some(remote_ifid),
            Activation::Inactive => None,
        }
    }
}

/// Immutable point-in-time view of all local interfaces.
///
/// Cloning is cheap; one snapshot is taken per cycle and shared by all tasks.
#[derive(Clone, Debug, Default)]
pub struct InterfaceSnapshot {
    interfaces: Arc<BTreeMap<IfId, Interface>>,
}

impl InterfaceSnapshot {
    pub fn new(interfaces: BTreeMap<IfId, Interface>) -> Self {
        Self {
            interfaces: Arc::new(interfaces),
        }
    }

    pub fn get(&self, ifid: IfId) -> Option<&Interface> {
        self.interfaces.get(&ifid)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.values()
    }

    /// Active interfaces of `role`, in interface id order.
    pub fn active_with_role(&self, role: LinkRole) -> impl Iterator<Item = &Interface> {
        self.iter()
            .filter(move |intf| intf.role == role && intf.is_active())
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Copy of the underlying map, for copy-on-write updates.
    pub fn to_map(&self) -> BTreeMap<IfId, Interface> {
        (*self.interfaces).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ia: &str, ingress: u64, egress: u64) -> HopEntry {
        HopEntry {
            ia: ia.parse().unwrap(),
            ingress: IfId(ingress),
            egress: IfId(egress),
            exp_time: ExpTime::default(),
            mtu: 1472,
            mac: [0; HOP_MAC_LEN],
            peers: Vec::new(),
            signature: Vec::new(),
        }
    }

    fn segment(entries: Vec<HopEntry>) -> PathSegment {
        PathSegment {
            info: SegmentInfo {
                timestamp: 1_700_000_000,
                segment_id: 7,
            },
            entries,
        }
    }

    #[test]
    fn test_exp_time_lifetime() {
        assert_eq!(ExpTime(0).lifetime_secs(), 337);
        assert_eq!(ExpTime::MAX.lifetime_secs(), 86_400);
        assert_eq!(ExpTime::default().lifetime_secs(), 21_600);
    }

    #[test]
    fn test_exp_time_max_within() {
        assert_eq!(ExpTime::max_within(0), None);
        assert_eq!(ExpTime::max_within(337), None);
        assert_eq!(ExpTime::max_within(338), Some(ExpTime(0)));
        assert_eq!(ExpTime::max_within(21_600), Some(ExpTime(63)));
        assert_eq!(ExpTime::max_within(u64::MAX), Some(ExpTime::MAX));
    }

    #[test]
    fn test_beacon_id_ignores_authenticators() {
        let a = segment(vec![entry("1-ff00:0:110", 0, 1)]);
        let mut b = a.clone();
        b.entries[0].mac = [9; HOP_MAC_LEN];
        b.entries[0].signature = vec![1, 2, 3];
        assert_eq!(a.id(), b.id());

        let mut c = a.clone();
        c.entries[0].egress = IfId(2);
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_beacon_rejects_empty_segment() {
        assert_eq!(
            Beacon::new(segment(Vec::new()), IfId(1)).unwrap_err(),
            InvariantViolation::EmptySegment
        );
    }

    #[test]
    fn test_beacon_last_ia() {
        let beacon = Beacon::new(
            segment(vec![
                entry("1-ff00:0:110", 0, 1),
                entry("1-ff00:0:120", 2, 3),
            ]),
            IfId(4),
        )
        .unwrap();
        assert_eq!(beacon.last_ia(), Some("1-ff00:0:120".parse().unwrap()));
        assert!(beacon.segment.contains_ia("1-ff00:0:110".parse().unwrap()));
        assert!(!beacon.segment.contains_ia("1-ff00:0:130".parse().unwrap()));
    }

    #[test]
    fn test_snapshot_filters_by_role_and_activity() {
        let addr: SocketAddr = "127.0.0.1:30041".parse().unwrap();
        let mut map = BTreeMap::new();
        for (id, role, active) in [
            (1, LinkRole::Core, true),
            (2, LinkRole::Core, false),
            (3, LinkRole::Child, true),
        ] {
            map.insert(
                IfId(id),
                Interface {
                    ifid: IfId(id),
                    role,
                    remote_ia: "1-ff00:0:120".parse().unwrap(),
                    remote_addr: addr,
                    activation: if active {
                        Activation::Active {
                            remote_ifid: IfId(id + 100),
                        }
                    } else {
                        Activation::Inactive
                    },
                },
            );
        }
        let snap = InterfaceSnapshot::new(map);
        let core: Vec<IfId> = snap.active_with_role(LinkRole::Core).map(|i| i.ifid).collect();
        assert_eq!(core, vec![IfId(1)]);
        assert_eq!(snap.get(IfId(3)).and_then(|i| i.remote_ifid()), Some(IfId(103)));
        assert_eq!(snap.get(IfId(2)).and_then(|i| i.remote_ifid()), None);
    }
}
