//! Structural invariants of path segments.

use shared_types::{Isd, IsdAs};
use std::collections::BTreeSet;

use super::PathSegment;

/// INVARIANT-1: Non-empty
/// A beacon carries at least the origin's hop entry.
pub fn invariant_non_empty(segment: &PathSegment) -> bool {
    !segment.entries.is_empty()
}

/// INVARIANT-2: Unique ASes
/// No AS appears twice on a segment. Returns the first repeated AS.
pub fn invariant_unique_ases(segment: &PathSegment) -> Option<IsdAs> {
    let mut seen = BTreeSet::new();
    segment
        .entries
        .iter()
        .map(|e| e.ia)
        .find(|ia| !seen.insert(*ia))
}

/// INVARIANT-3: Size Limit
/// No extended segment larger than the MTU leaves the AS.
pub fn invariant_size_limit(encoded_len: usize, mtu: u16) -> bool {
    encoded_len <= usize::from(mtu)
}

/// True if the ISD sequence re-enters an ISD after having left it.
///
/// Consecutive hops inside the same ISD are fine; `1 1 2 2` is not a loop,
/// `1 2 1` is.
pub fn has_isd_loop(isds: impl IntoIterator<Item = Isd>) -> bool {
    let mut left = BTreeSet::new();
    let mut current: Option<Isd> = None;
    for isd in isds {
        if current == Some(isd) {
            continue;
        }
        if left.contains(&isd) {
            return true;
        }
        if let Some(prev) = current {
            left.insert(prev);
        }
        current = Some(isd);
    }
    false
}

/// Segment check result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    EmptySegment,
    DuplicateAs(IsdAs),
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvariantViolation::EmptySegment => write!(f, "segment has no hop entries"),
            InvariantViolation::DuplicateAs(ia) => write!(f, "AS {} appears twice", ia),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all invariants for a received segment.
pub fn check_segment(segment: &PathSegment) -> Result<(), InvariantViolation> {
    if !invariant_non_empty(segment) {
        return Err(InvariantViolation::EmptySegment);
    }

    if let Some(ia) = invariant_unique_ases(segment) {
        return Err(InvariantViolation::DuplicateAs(ia));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExpTime, HopEntry, SegmentInfo};
    use shared_types::IfId;

    fn segment(ases: &[&str]) -> PathSegment {
        PathSegment {
            info: SegmentInfo {
                timestamp: 0,
                segment_id: 0,
            },
            entries: ases
                .iter()
                .map(|ia| HopEntry {
                    ia: ia.parse().unwrap(),
                    ingress: IfId::NONE,
                    egress: IfId(1),
                    exp_time: ExpTime::default(),
                    mtu: 1472,
                    mac: [0; 6],
                    peers: Vec::new(),
                    signature: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_invariant_unique_ases() {
        assert!(check_segment(&segment(&["1-ff00:0:110", "1-ff00:0:120"])).is_ok());
        assert_eq!(
            check_segment(&segment(&["1-ff00:0:110", "1-ff00:0:120", "1-ff00:0:110"])),
            Err(InvariantViolation::DuplicateAs("1-ff00:0:110".parse().unwrap()))
        );
    }

    #[test]
    fn test_invariant_non_empty() {
        assert_eq!(
            check_segment(&segment(&[])),
            Err(InvariantViolation::EmptySegment)
        );
    }

    #[test]
    fn test_invariant_size_limit() {
        assert!(invariant_size_limit(1472, 1472));
        assert!(!invariant_size_limit(1473, 1472));
    }

    #[test]
    fn test_isd_loop_detection() {
        assert!(!has_isd_loop([Isd(1), Isd(1), Isd(2), Isd(2)]));
        assert!(!has_isd_loop([Isd(1), Isd(2), Isd(3)]));
        assert!(has_isd_loop([Isd(1), Isd(2), Isd(1)]));
        assert!(has_isd_loop([Isd(1), Isd(1), Isd(2), Isd(3), Isd(2)]));
        assert!(!has_isd_loop(std::iter::empty()));
    }
}
