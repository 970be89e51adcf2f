//! # Core Identifiers
//!
//! Defines the addressing identifiers of the path-based control plane.
//!
//! ## Identifiers
//!
//! - [`Isd`]: isolation domain number
//! - [`AsId`]: 48-bit autonomous system number
//! - [`IsdAs`]: the globally unique `(ISD, AS)` pair
//! - [`IfId`]: interface identifier, scoped to one AS
//! - [`LinkRole`]: the relationship a local interface has to its neighbor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::IdentifierError;

/// Largest AS number that is written in decimal (BGP-compatible range).
pub const MAX_BGP_AS: u64 = u32::MAX as u64;

/// Largest representable AS number (48 bits).
pub const MAX_AS: u64 = (1 << 48) - 1;

/// Isolation domain identifier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Isd(pub u16);

impl fmt::Display for Isd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Autonomous system number (48 significant bits).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64")]
pub struct AsId(u64);

impl AsId {
    /// Creates an AS number, rejecting values wider than 48 bits.
    pub fn new(value: u64) -> Result<Self, IdentifierError> {
        if value > MAX_AS {
            return Err(IdentifierError::AsOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the raw numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl TryFrom<u64> for AsId {
    type Error = IdentifierError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for AsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= MAX_BGP_AS {
            return write!(f, "{}", self.0);
        }
        write!(
            f,
            "{:x}:{:x}:{:x}",
            (self.0 >> 32) & 0xffff,
            (self.0 >> 16) & 0xffff,
            self.0 & 0xffff
        )
    }
}

impl FromStr for AsId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains(':') {
            let value: u64 = s
                .parse()
                .map_err(|_| IdentifierError::MalformedAs(s.to_string()))?;
            if value > MAX_BGP_AS {
                return Err(IdentifierError::MalformedAs(s.to_string()));
            }
            return Ok(Self(value));
        }

        let groups: Vec<&str> = s.split(':').collect();
        if groups.len() != 3 {
            return Err(IdentifierError::MalformedAs(s.to_string()));
        }
        let mut value = 0u64;
        for group in groups {
            let part = u16::from_str_radix(group, 16)
                .map_err(|_| IdentifierError::MalformedAs(s.to_string()))?;
            value = (value << 16) | u64::from(part);
        }
        Ok(Self(value))
    }
}

/// Globally unique AS identity: `(ISD, AS)`.
///
/// # Example
///
/// ```rust
/// use shared_types::IsdAs;
///
/// let ia: IsdAs = "1-ff00:0:110".parse().unwrap();
/// assert_eq!(ia.isd.0, 1);
/// assert_eq!(ia.to_string(), "1-ff00:0:110");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct IsdAs {
    /// Isolation domain.
    pub isd: Isd,
    /// AS number within the ISD.
    pub as_id: AsId,
}

impl IsdAs {
    /// Creates an ISD-AS pair from its numeric parts.
    pub fn new(isd: u16, as_id: u64) -> Result<Self, IdentifierError> {
        Ok(Self {
            isd: Isd(isd),
            as_id: AsId::new(as_id)?,
        })
    }

    /// True if either part is zero (the wildcard value `0-0`).
    pub fn is_wildcard(&self) -> bool {
        self.isd.0 == 0 || self.as_id.0 == 0
    }

    /// Fixed-width big-endian encoding (2 bytes ISD, 6 bytes AS) used as MAC input.
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut out = [0u8; 8];
        out[..2].copy_from_slice(&self.isd.0.to_be_bytes());
        out[2..].copy_from_slice(&self.as_id.0.to_be_bytes()[2..]);
        out
    }
}

impl fmt::Display for IsdAs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.isd, self.as_id)
    }
}

impl FromStr for IsdAs {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (isd, as_part) = s
            .split_once('-')
            .ok_or_else(|| IdentifierError::MalformedIsdAs(s.to_string()))?;
        let isd: u16 = isd
            .parse()
            .map_err(|_| IdentifierError::MalformedIsdAs(s.to_string()))?;
        Ok(Self {
            isd: Isd(isd),
            as_id: as_part.parse()?,
        })
    }
}

impl TryFrom<String> for IsdAs {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IsdAs> for String {
    fn from(value: IsdAs) -> Self {
        value.to_string()
    }
}

/// Interface identifier, unique within one AS.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct IfId(pub u64);

impl IfId {
    /// Marks "no interface", e.g. the ingress of the origin AS.
    pub const NONE: IfId = IfId(0);
}

impl fmt::Display for IfId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a local interface relative to the neighbor it connects to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkRole {
    /// Link between two core ASes.
    Core,
    /// Link towards a customer (child) AS.
    Child,
    /// Peering link.
    Peer,
    /// Uplink towards a provider (parent) AS.
    Parent,
}
