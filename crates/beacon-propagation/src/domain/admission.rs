//! Egress admissibility and loop prevention.
//!
//! Pure functions over a beacon and an interface snapshot. The policy is
//! chosen once from the configured AS role.

use shared_types::{IfId, IsdAs, LinkRole};
use std::collections::BTreeSet;

use super::invariants::has_isd_loop;
use super::{AsRole, Beacon, Interface, InterfaceSnapshot, PropagationConfig};

/// Egress selection strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionPolicy {
    /// Active core links, minus the ingress and every link leading to an AS
    /// already on the segment.
    Core {
        local_ia: IsdAs,
        allow_isd_loop: bool,
    },
    /// Active child links.
    NonCore,
}

impl AdmissionPolicy {
    pub fn from_config(config: &PropagationConfig) -> Self {
        match config.role {
            AsRole::Core => AdmissionPolicy::Core {
                local_ia: config.local_ia,
                allow_isd_loop: config.allow_isd_loop,
            },
            AsRole::NonCore => AdmissionPolicy::NonCore,
        }
    }

    /// Link role beacons are propagated on.
    pub fn egress_role(&self) -> LinkRole {
        match self {
            AdmissionPolicy::Core { .. } => LinkRole::Core,
            AdmissionPolicy::NonCore => LinkRole::Child,
        }
    }
}

/// Why a beacon's ingress interface cannot be trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngressRejection {
    Unknown(IfId),
    Inactive(IfId),
    /// The interface leads to a different AS than the segment's last hop.
    RemoteMismatch {
        ifid: IfId,
        expected: IsdAs,
        actual: Option<IsdAs>,
    },
}

impl std::fmt::Display for IngressRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngressRejection::Unknown(ifid) => write!(f, "unknown ingress interface {}", ifid),
            IngressRejection::Inactive(ifid) => write!(f, "ingress interface {} inactive", ifid),
            IngressRejection::RemoteMismatch {
                ifid,
                expected,
                actual,
            } => match actual {
                Some(actual) => write!(
                    f,
                    "ingress interface {} leads to {}, last hop is {}",
                    ifid, expected, actual
                ),
                None => write!(f, "ingress interface {} but segment is empty", ifid),
            },
        }
    }
}

/// Resolves and validates the interface a beacon arrived on.
pub fn check_ingress<'a>(
    beacon: &Beacon,
    snapshot: &'a InterfaceSnapshot,
) -> Result<&'a Interface, IngressRejection> {
    let intf = snapshot
        .get(beacon.ingress)
        .ok_or(IngressRejection::Unknown(beacon.ingress))?;
    if !intf.is_active() {
        return Err(IngressRejection::Inactive(beacon.ingress));
    }
    let last = beacon.last_ia();
    if last != Some(intf.remote_ia) {
        return Err(IngressRejection::RemoteMismatch {
            ifid: intf.ifid,
            expected: intf.remote_ia,
            actual: last,
        });
    }
    Ok(intf)
}

/// True if at least one interface could receive beacons under `policy`.
pub fn has_egress_candidates(policy: &AdmissionPolicy, snapshot: &InterfaceSnapshot) -> bool {
    snapshot.active_with_role(policy.egress_role()).next().is_some()
}

/// Egress interfaces `beacon` may be propagated on.
///
/// Empty if the ingress check fails.
pub fn admissible_interfaces(
    policy: &AdmissionPolicy,
    beacon: &Beacon,
    snapshot: &InterfaceSnapshot,
) -> BTreeSet<IfId> {
    if check_ingress(beacon, snapshot).is_err() {
        return BTreeSet::new();
    }
    let candidates = snapshot.active_with_role(policy.egress_role());
    match *policy {
        AdmissionPolicy::NonCore => candidates.map(|intf| intf.ifid).collect(),
        AdmissionPolicy::Core {
            local_ia,
            allow_isd_loop,
        } => candidates
            .filter(|intf| intf.ifid != beacon.ingress)
            .filter(|intf| !beacon.segment.contains_ia(intf.remote_ia))
            .filter(|intf| allow_isd_loop || !creates_isd_loop(beacon, local_ia, intf))
            .map(|intf| intf.ifid)
            .collect(),
    }
}

fn creates_isd_loop(beacon: &Beacon, local_ia: IsdAs, egress: &Interface) -> bool {
    let path = beacon
        .segment
        .isds()
        .chain([local_ia.isd, egress.remote_ia.isd]);
    has_isd_loop(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Activation, ExpTime, HopEntry, PathSegment, SegmentInfo};
    use std::collections::BTreeMap;

    const LOCAL: &str = "1-ff00:0:110";

    fn ia(s: &str) -> IsdAs {
        s.parse().unwrap()
    }

    fn intf(id: u64, role: LinkRole, remote: &str, active: bool) -> Interface {
        Interface {
            ifid: IfId(id),
            role,
            remote_ia: ia(remote),
            remote_addr: "127.0.0.1:30041".parse().unwrap(),
            activation: if active {
                Activation::Active {
                    remote_ifid: IfId(id + 100),
                }
            } else {
                Activation::Inactive
            },
        }
    }

    fn snapshot(interfaces: Vec<Interface>) -> InterfaceSnapshot {
        InterfaceSnapshot::new(interfaces.into_iter().map(|i| (i.ifid, i)).collect::<BTreeMap<_, _>>())
    }

    fn beacon(path: &[&str], ingress: u64) -> Beacon {
        let entries = path
            .iter()
            .map(|as_| HopEntry {
                ia: ia(as_),
                ingress: IfId::NONE,
                egress: IfId(1),
                exp_time: ExpTime::default(),
                mtu: 1472,
                mac: [0; 6],
                peers: Vec::new(),
                signature: Vec::new(),
            })
            .collect();
        Beacon::new(
            PathSegment {
                info: SegmentInfo {
                    timestamp: 0,
                    segment_id: 0,
                },
                entries,
            },
            IfId(ingress),
        )
        .unwrap()
    }

    fn core_policy(allow_isd_loop: bool) -> AdmissionPolicy {
        AdmissionPolicy::Core {
            local_ia: ia(LOCAL),
            allow_isd_loop,
        }
    }

    fn core_topology(x: bool, y: bool, z: bool) -> InterfaceSnapshot {
        snapshot(vec![
            intf(1, LinkRole::Core, "1-ff00:0:120", x),
            intf(2, LinkRole::Core, "1-ff00:0:130", y),
            intf(3, LinkRole::Core, "1-ff00:0:140", z),
            intf(4, LinkRole::Peer, "1-ff00:0:150", true),
        ])
    }

    fn ids(ids: &[u64]) -> BTreeSet<IfId> {
        ids.iter().copied().map(IfId).collect()
    }

    #[test]
    fn test_core_excludes_ingress() {
        let snap = core_topology(true, true, true);
        let b = beacon(&["1-ff00:0:120"], 1);
        assert_eq!(admissible_interfaces(&core_policy(true), &b, &snap), ids(&[2, 3]));
    }

    #[test]
    fn test_core_loop_prevention() {
        let snap = core_topology(true, true, true);
        let b = beacon(&["1-ff00:0:130", "1-ff00:0:120"], 1);
        assert_eq!(admissible_interfaces(&core_policy(true), &b, &snap), ids(&[3]));
    }

    #[test]
    fn test_core_skips_inactive_egress() {
        let snap = core_topology(true, false, true);
        let b = beacon(&["1-ff00:0:120"], 1);
        assert_eq!(admissible_interfaces(&core_policy(true), &b, &snap), ids(&[3]));
    }

    #[test]
    fn test_inactive_ingress_admits_nothing() {
        let snap = core_topology(false, true, true);
        let b = beacon(&["1-ff00:0:120"], 1);
        assert!(admissible_interfaces(&core_policy(true), &b, &snap).is_empty());
        assert_eq!(
            check_ingress(&b, &snap).unwrap_err(),
            IngressRejection::Inactive(IfId(1))
        );
    }

    #[test]
    fn test_ingress_must_match_last_hop() {
        let snap = core_topology(true, true, true);
        // Arrived on interface 1 (towards 120) but last hop claims 130.
        let b = beacon(&["1-ff00:0:130"], 1);
        assert!(matches!(
            check_ingress(&b, &snap),
            Err(IngressRejection::RemoteMismatch { .. })
        ));
        assert!(admissible_interfaces(&core_policy(true), &b, &snap).is_empty());

        let b = beacon(&["1-ff00:0:120"], 9);
        assert_eq!(
            check_ingress(&b, &snap).unwrap_err(),
            IngressRejection::Unknown(IfId(9))
        );
    }

    #[test]
    fn test_non_core_uses_active_children_only() {
        let snap = snapshot(vec![
            intf(1, LinkRole::Parent, "1-ff00:0:120", true),
            intf(2, LinkRole::Child, "1-ff00:0:130", true),
            intf(3, LinkRole::Child, "1-ff00:0:140", false),
            intf(4, LinkRole::Peer, "1-ff00:0:150", true),
            intf(5, LinkRole::Core, "1-ff00:0:160", true),
        ]);
        let b = beacon(&["1-ff00:0:120"], 1);
        assert_eq!(admissible_interfaces(&AdmissionPolicy::NonCore, &b, &snap), ids(&[2]));
    }

    #[test]
    fn test_isd_loop_filter() {
        let snap = snapshot(vec![
            intf(1, LinkRole::Core, "2-ff00:0:210", true),
            intf(2, LinkRole::Core, "2-ff00:0:220", true),
            intf(3, LinkRole::Core, "1-ff00:0:130", true),
        ]);
        // ISD sequence 2 -> 1 -> 2 re-enters ISD 2.
        let b = beacon(&["2-ff00:0:210"], 1);
        assert_eq!(admissible_interfaces(&core_policy(true), &b, &snap), ids(&[2, 3]));
        assert_eq!(admissible_interfaces(&core_policy(false), &b, &snap), ids(&[3]));
    }

    #[test]
    fn test_egress_candidates() {
        let snap = core_topology(false, false, false);
        assert!(!has_egress_candidates(&core_policy(true), &snap));
        assert!(!has_egress_candidates(&AdmissionPolicy::NonCore, &snap));
        assert!(has_egress_candidates(
            &core_policy(true),
            &core_topology(false, true, false)
        ));
    }

    #[test]
    fn test_policy_from_config() {
        let mut cfg = PropagationConfig {
            local_ia: ia(LOCAL),
            ..Default::default()
        };
        assert_eq!(AdmissionPolicy::from_config(&cfg), AdmissionPolicy::NonCore);
        cfg.role = AsRole::Core;
        assert_eq!(AdmissionPolicy::from_config(&cfg), core_policy(true));
        assert_eq!(AdmissionPolicy::from_config(&cfg).egress_role(), LinkRole::Core);
    }
}
