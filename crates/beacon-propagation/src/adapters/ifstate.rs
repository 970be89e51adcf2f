//! In-process interface registry.
//!
//! Activation state is owned by the link keepalive subsystem, which calls
//! [`Interfaces::activate`] and [`Interfaces::deactivate`]. The propagator
//! only ever reads snapshots.

use parking_lot::RwLock;
use shared_types::IfId;
use std::collections::BTreeMap;
use tracing::info;

use crate::domain::{Activation, Interface, InterfaceSnapshot};
use crate::errors::ConfigError;
use crate::ports::outbound::InterfaceRegistry;

/// Interface table with copy-on-write snapshots.
#[derive(Debug)]
pub struct Interfaces {
    current: RwLock<InterfaceSnapshot>,
}

impl Interfaces {
    /// Builds the table from the topology, rejecting duplicate interface ids.
    pub fn new(interfaces: impl IntoIterator<Item = Interface>) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for intf in interfaces {
            let ifid = intf.ifid;
            if map.insert(ifid, intf).is_some() {
                return Err(ConfigError::DuplicateInterface(ifid));
            }
        }
        Ok(Self {
            current: RwLock::new(InterfaceSnapshot::new(map)),
        })
    }

    /// Marks `ifid` active. Returns false for unknown interfaces.
    pub fn activate(&self, ifid: IfId, remote_ifid: IfId) -> bool {
        self.set(ifid, Activation::Active { remote_ifid })
    }

    /// Marks `ifid` inactive. Returns false for unknown interfaces.
    pub fn deactivate(&self, ifid: IfId) -> bool {
        self.set(ifid, Activation::Inactive)
    }

    fn set(&self, ifid: IfId, activation: Activation) -> bool {
        let mut current = self.current.write();
        let mut map = current.to_map();
        let Some(intf) = map.get_mut(&ifid) else {
            return false;
        };
        if intf.activation != activation {
            info!(%ifid, remote_ia = %intf.remote_ia, ?activation, "Interface state changed");
            intf.activation = activation;
            *current = InterfaceSnapshot::new(map);
        }
        true
    }
}

impl InterfaceRegistry for Interfaces {
    fn snapshot(&self) -> InterfaceSnapshot {
        self.current.read().clone()
    }
}
