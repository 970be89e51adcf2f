//! In-memory beacon provider.
//!
//! Holds the beacons received since the last cycle. Durable storage lives
//! elsewhere; this adapter is what the receiving side fills and the
//! propagator drains.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use crate::domain::Beacon;
use crate::errors::ProviderError;
use crate::ports::outbound::{BeaconProvider, BeaconStream};

/// Beacon queue handed out as one stream per cycle.
#[derive(Debug, Default)]
pub struct MemoryBeaconProvider {
    pending: Mutex<Vec<Result<Beacon, ProviderError>>>,
    /// Keep beacons after a cycle instead of draining them.
    retain: bool,
}

impl MemoryBeaconProvider {
    /// Provider that hands out each beacon once.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that hands out the same beacons every cycle.
    pub fn retaining(beacons: impl IntoIterator<Item = Beacon>) -> Self {
        Self {
            pending: Mutex::new(beacons.into_iter().map(Ok).collect()),
            retain: true,
        }
    }

    pub fn push(&self, beacon: Beacon) {
        self.pending.lock().push(Ok(beacon));
    }

    /// Queues an item that could not be retrieved.
    pub fn push_fault(&self, err: ProviderError) {
        self.pending.lock().push(Err(err));
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

#[async_trait]
impl BeaconProvider for MemoryBeaconProvider {
    async fn beacons_to_propagate(&self) -> Result<BeaconStream, ProviderError> {
        let items = if self.retain {
            self.pending.lock().clone()
        } else {
            std::mem::take(&mut *self.pending.lock())
        };
        Ok(stream::iter(items).boxed())
    }
}
