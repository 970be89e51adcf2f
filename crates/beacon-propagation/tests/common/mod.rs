//! Shared fixtures for propagation tests.

#![allow(dead_code)]

use async_trait::async_trait;
use beacon_propagation::adapters::{Interfaces, KeySigner, MemoryBeaconProvider};
use beacon_propagation::ports::outbound::{BeaconSender, Destination};
use beacon_propagation::{
    Activation, AsRole, Beacon, BeaconId, ExpTime, ExtendedBeacon, HopEntry, Interface,
    PathSegment, PropagationConfig, Propagator, SegmentInfo, TransportError,
};
use parking_lot::Mutex;
use shared_crypto::{AsSigningKey, HopMacKey};
use shared_types::{current_timestamp, IfId, IsdAs, LinkRole};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MAC_KEY: [u8; 16] = [0x5a; 16];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn ia(s: &str) -> IsdAs {
    s.parse().unwrap()
}

pub fn intf(id: u64, role: LinkRole, remote: &str, active: bool) -> Interface {
    Interface {
        ifid: IfId(id),
        role,
        remote_ia: ia(remote),
        remote_addr: format!("127.0.0.1:{}", 40_000 + id).parse().unwrap(),
        activation: if active {
            Activation::Active {
                remote_ifid: IfId(id + 100),
            }
        } else {
            Activation::Inactive
        },
    }
}

/// Unsigned segment through `path` (origin first), received on `ingress`.
pub fn beacon(path: &[&str], ingress: u64, segment_id: u16) -> Beacon {
    let entries = path
        .iter()
        .enumerate()
        .map(|(i, as_)| HopEntry {
            ia: ia(as_),
            ingress: if i == 0 { IfId::NONE } else { IfId(10 + i as u64) },
            egress: IfId(20 + i as u64),
            exp_time: ExpTime::default(),
            mtu: 1472,
            mac: [i as u8; 6],
            peers: Vec::new(),
            signature: vec![0xee; 64],
        })
        .collect();
    Beacon::new(
        PathSegment {
            info: SegmentInfo {
                timestamp: current_timestamp() as u32,
                segment_id,
            },
            entries,
        },
        IfId(ingress),
    )
    .unwrap()
}

pub fn config(local: &str, role: AsRole) -> PropagationConfig {
    PropagationConfig {
        local_ia: ia(local),
        role,
        ..Default::default()
    }
}

pub fn signer(local: &str) -> Arc<KeySigner> {
    Arc::new(KeySigner::new(ia(local), AsSigningKey::generate(u64::MAX)))
}

pub fn build(
    config: PropagationConfig,
    interfaces: Vec<Interface>,
    provider: Arc<MemoryBeaconProvider>,
    sender: Arc<RecordingSender>,
) -> Propagator {
    let local = config.local_ia.to_string();
    Propagator::builder(config)
        .signer(signer(&local))
        .mac_key(HopMacKey::new(MAC_KEY.to_vec()).unwrap())
        .registry(Arc::new(Interfaces::new(interfaces).unwrap()))
        .provider(provider)
        .sender(sender)
        .build()
        .unwrap()
}

/// How the mock transport treats one egress interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    Deliver,
    Fail,
    Hang,
}

/// Mock transport recording every delivered beacon.
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(BeaconId, IfId, Arc<PathSegment>, Destination)>>,
    failing: BTreeSet<IfId>,
    hanging: BTreeSet<IfId>,
    delay: Option<Duration>,
    started: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, ifid: u64, behavior: Behavior) -> Self {
        match behavior {
            Behavior::Deliver => {}
            Behavior::Fail => {
                self.failing.insert(IfId(ifid));
            }
            Behavior::Hang => {
                self.hanging.insert(IfId(ifid));
            }
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// (source beacon, egress) of every delivered beacon, sorted.
    pub fn dispatches(&self) -> Vec<(BeaconId, IfId)> {
        let mut out: Vec<_> = self.sent.lock().iter().map(|(b, e, _, _)| (*b, *e)).collect();
        out.sort();
        out
    }

    pub fn sent(&self) -> Vec<(Arc<PathSegment>, Destination)> {
        self.sent
            .lock()
            .iter()
            .map(|(_, _, seg, dst)| (Arc::clone(seg), dst.clone()))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Number of send calls entered, whether or not they completed.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BeaconSender for RecordingSender {
    async fn send(&self, beacon: &ExtendedBeacon, dst: &Destination) -> Result<(), TransportError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if self.hanging.contains(&dst.ifid) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&dst.ifid) {
            return Err(TransportError::Io("connection refused".into()));
        }
        self.sent.lock().push((
            beacon.source,
            beacon.egress,
            Arc::clone(&beacon.segment),
            dst.clone(),
        ));
        Ok(())
    }
}

pub fn expected(pairs: &[(&Beacon, u64)]) -> Vec<(BeaconId, IfId)> {
    let mut out: Vec<_> = pairs.iter().map(|(b, e)| (b.id(), IfId(*e))).collect();
    out.sort();
    out
}
