//! Value objects for propagation configuration.

use serde::{Deserialize, Serialize};
use shared_types::IsdAs;

use super::ExpTime;
use crate::errors::ConfigError;

/// Smallest MTU the propagator accepts.
pub const MIN_SEGMENT_MTU: u16 = 256;

/// Role of the local AS in the topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsRole {
    /// Member of the core; propagates on core links.
    Core,
    /// Leaf or transit AS; propagates on child links.
    #[default]
    NonCore,
}

/// Beacon propagation configuration.
///
/// Deserializable from any serde format; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// The local AS.
    pub local_ia: IsdAs,
    /// Core or non-core propagation policy.
    pub role: AsRole,
    /// Maximum encoded size of an extended segment, in bytes
    pub mtu: u16,
    /// Upper bound for the expiry of hop entries created here
    pub max_exp_time: ExpTime,
    /// Allow core beacons to leave and re-enter an ISD
    pub allow_isd_loop: bool,
    /// Maximum number of sends in flight
    pub max_concurrent_sends: usize,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            local_ia: IsdAs::default(),
            role: AsRole::NonCore,
            mtu: 1472,
            max_exp_time: ExpTime::default(),
            allow_isd_loop: true,
            max_concurrent_sends: 64,
        }
    }
}

impl PropagationConfig {
    /// Checks the values that do not depend on the wired-up collaborators.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.local_ia.is_wildcard() {
            return Err(ConfigError::InvalidLocalIa(self.local_ia));
        }
        if self.mtu < MIN_SEGMENT_MTU {
            return Err(ConfigError::InvalidMtu {
                mtu: self.mtu,
                min: MIN_SEGMENT_MTU,
            });
        }
        if self.max_concurrent_sends == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        Ok(())
    }
}
