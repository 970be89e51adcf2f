//! # Beacon Propagation Service
//!
//! Runs propagation cycles.
//!
//! ## Cycle
//!
//! 1. Snapshot the interfaces; stop early if no egress candidate is active
//! 2. Drain the beacon source, dropping beacons with an untrusted ingress
//! 3. Compute the admissible egress set per beacon and extend towards each
//! 4. Dispatch every extension concurrently (bounded by a semaphore)
//! 5. Await completion, or stop at cancellation and abandon what is in flight
//!
//! Steps 1-3 run on the calling task and never suspend except on the beacon
//! source. Step 4 spawns one tokio task per send.
//!
//! ## Dependencies
//!
//! Requires four port implementations plus the hop MAC key:
//! - `BeaconProvider` - candidate beacons
//! - `InterfaceRegistry` - interface snapshots
//! - `BeaconSigner` - AS signatures
//! - `BeaconSender` - one-hop delivery

use async_trait::async_trait;
use futures::future::join_all;
use futures::StreamExt;
use shared_crypto::HopMacKey;
use shared_types::LinkRole;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn, Instrument};

use crate::cycle::{Accumulator, CycleContext, CycleReport, FailureKind, TaskFailure};
use crate::domain::{
    admissible_interfaces, check_ingress, has_egress_candidates, AdmissionPolicy, Beacon,
    BeaconId, ExtendedBeacon, Extender, Interface, InterfaceSnapshot, PropagationConfig,
};
use crate::errors::ConfigError;
use crate::ports::inbound::BeaconPropagationApi;
use crate::ports::outbound::{
    BeaconProvider, BeaconSender, BeaconSigner, Destination, InterfaceRegistry,
};

/// One (beacon, egress) unit of work, ready to send.
struct PropagationTask {
    beacon: BeaconId,
    extended: ExtendedBeacon,
    destination: Destination,
}

/// Beacon propagator.
///
/// ## Thread Safety
///
/// Shareable via `Arc`. Cycles hold no state between runs; concurrent cycles
/// are independent.
pub struct Propagator {
    config: PropagationConfig,
    policy: AdmissionPolicy,
    extender: Extender,
    signer: Arc<dyn BeaconSigner>,
    registry: Arc<dyn InterfaceRegistry>,
    provider: Arc<dyn BeaconProvider>,
    sender: Arc<dyn BeaconSender>,
}

impl std::fmt::Debug for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagator")
            .field("config", &self.config)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Propagator {
    pub fn builder(config: PropagationConfig) -> PropagatorBuilder {
        PropagatorBuilder::new(config)
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    pub fn policy(&self) -> AdmissionPolicy {
        self.policy
    }

    /// Opens the beacon source and turns every beacon into send tasks.
    async fn prepare(
        &self,
        ctx: &CycleContext,
        snapshot: &InterfaceSnapshot,
        report: &mut CycleReport,
    ) -> Vec<PropagationTask> {
        let opened = tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                report.cancelled = true;
                return Vec::new();
            }
            opened = self.provider.beacons_to_propagate() => opened,
        };
        let mut beacons = match opened {
            Ok(stream) => stream,
            Err(err) => {
                error!(%err, "Unable to open beacon source");
                report.retrieval_faults += 1;
                return Vec::new();
            }
        };

        let peers: Vec<Interface> = snapshot
            .iter()
            .filter(|intf| intf.role == LinkRole::Peer)
            .cloned()
            .collect();

        let mut tasks = Vec::new();
        loop {
            let item = tokio::select! {
                biased;
                _ = ctx.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                item = beacons.next() => item,
            };
            match item {
                None => break,
                Some(Err(err)) => {
                    warn!(%err, "Skipping beacon that could not be retrieved");
                    report.retrieval_faults += 1;
                }
                Some(Ok(beacon)) => {
                    report.beacons_received += 1;
                    self.plan(&beacon, snapshot, &peers, report, &mut tasks);
                }
            }
        }
        tasks
    }

    /// Admissibility and extension for one beacon. Never suspends.
    fn plan(
        &self,
        beacon: &Beacon,
        snapshot: &InterfaceSnapshot,
        peers: &[Interface],
        report: &mut CycleReport,
        tasks: &mut Vec<PropagationTask>,
    ) {
        let id = beacon.id();
        if let Err(reason) = check_ingress(beacon, snapshot) {
            debug!(beacon = %id, %reason, "Dropping beacon");
            report.ingress_rejected += 1;
            return;
        }

        for egress in admissible_interfaces(&self.policy, beacon, snapshot) {
            let Some(intf) = snapshot.get(egress) else {
                continue;
            };
            let Some(remote_ifid) = intf.remote_ifid() else {
                continue;
            };
            match self
                .extender
                .extend(beacon, intf, peers, self.signer.as_ref())
            {
                Ok(extended) => tasks.push(PropagationTask {
                    beacon: id,
                    extended,
                    destination: Destination {
                        ia: intf.remote_ia,
                        ifid: egress,
                        remote_ifid,
                        addr: intf.remote_addr,
                    },
                }),
                Err(err) => {
                    warn!(beacon = %id, %egress, %err, "Unable to extend beacon");
                    report.extension_faults += 1;
                    report.failures.push(TaskFailure {
                        beacon: id,
                        egress,
                        kind: FailureKind::Extension(err),
                    });
                }
            }
        }
    }

    /// Fans the tasks out and waits for them, or for cancellation.
    async fn dispatch(&self, ctx: &CycleContext, tasks: Vec<PropagationTask>, report: &mut CycleReport) {
        let outcomes = Arc::new(Accumulator::default());
        let mut pending = tasks.into_iter().peekable();

        if !report.cancelled {
            let limiter = Arc::new(Semaphore::new(self.config.max_concurrent_sends));
            let mut handles = Vec::with_capacity(pending.len());

            while pending.peek().is_some() {
                let permit = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    permit = Arc::clone(&limiter).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let Some(task) = pending.next() else {
                    break;
                };
                let sender = Arc::clone(&self.sender);
                let outcomes = Arc::clone(&outcomes);
                let send = async move {
                    let _permit = permit;
                    let PropagationTask {
                        beacon,
                        extended,
                        destination,
                    } = task;
                    let result = sender.send(&extended, &destination).await;
                    match &result {
                        Ok(()) => debug!(%beacon, egress = %destination.ifid, "Beacon sent"),
                        Err(err) => warn!(%beacon, egress = %destination.ifid, %err, "Unable to send beacon"),
                    }
                    if !outcomes.record(beacon, destination.ifid, result) {
                        debug!(%beacon, egress = %destination.ifid, "Discarding late send result");
                    }
                };
                handles.push(tokio::spawn(send.in_current_span()));
                report.attempted += 1;
            }

            if !report.cancelled {
                tokio::select! {
                    biased;
                    results = join_all(handles) => {
                        for joined in results {
                            if let Err(err) = joined {
                                warn!(%err, "Send task did not complete");
                            }
                        }
                    }
                    _ = ctx.cancelled() => report.cancelled = true,
                }
            }
        }

        report.not_started = pending.len();
        let settled = outcomes.close();
        report.succeeded = settled.succeeded;
        report.failed = settled.failed;
        report.abandoned = report
            .attempted
            .saturating_sub(settled.succeeded + settled.failed);
        report.propagated = settled.propagated;
        report.propagated_egress = settled.propagated_egress;
        report.failures.extend(settled.failures);
    }
}

#[async_trait]
impl BeaconPropagationApi for Propagator {
    #[instrument(skip_all, fields(local_ia = %self.config.local_ia, role = ?self.config.role))]
    async fn run_cycle(&self, ctx: CycleContext) -> CycleReport {
        let mut report = CycleReport::default();
        if ctx.is_cancelled() {
            report.cancelled = true;
            return report;
        }

        let snapshot = self.registry.snapshot();
        if !has_egress_candidates(&self.policy, &snapshot) {
            debug!(egress_role = ?self.policy.egress_role(), "No active egress interfaces");
            return report;
        }

        let tasks = self.prepare(&ctx, &snapshot, &mut report).await;
        self.dispatch(&ctx, tasks, &mut report).await;

        info!(
            beacons = report.beacons_received,
            propagated = report.propagated,
            egress = ?report.propagated_egress,
            succeeded = report.succeeded,
            failed = report.failed + report.extension_faults,
            abandoned = report.abandoned,
            not_started = report.not_started,
            cancelled = report.cancelled,
            "Propagation cycle finished"
        );
        report
    }
}

/// Assembles a [`Propagator`], refusing incomplete configurations.
pub struct PropagatorBuilder {
    config: PropagationConfig,
    signer: Option<Arc<dyn BeaconSigner>>,
    mac_key: Option<HopMacKey>,
    registry: Option<Arc<dyn InterfaceRegistry>>,
    provider: Option<Arc<dyn BeaconProvider>>,
    sender: Option<Arc<dyn BeaconSender>>,
}

impl PropagatorBuilder {
    pub fn new(config: PropagationConfig) -> Self {
        Self {
            config,
            signer: None,
            mac_key: None,
            registry: None,
            provider: None,
            sender: None,
        }
    }

    pub fn signer<S: BeaconSigner + 'static>(mut self, signer: Arc<S>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn mac_key(mut self, key: HopMacKey) -> Self {
        self.mac_key = Some(key);
        self
    }

    pub fn registry<R: InterfaceRegistry + 'static>(mut self, registry: Arc<R>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn provider<P: BeaconProvider + 'static>(mut self, provider: Arc<P>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn sender<T: BeaconSender + 'static>(mut self, sender: Arc<T>) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn build(self) -> Result<Propagator, ConfigError> {
        self.config.validate()?;

        let signer = self.signer.ok_or(ConfigError::MissingSigner)?;
        let mac_key = self.mac_key.ok_or(ConfigError::MissingMacKey)?;
        let registry = self.registry.ok_or(ConfigError::MissingRegistry)?;
        let provider = self.provider.ok_or(ConfigError::MissingProvider)?;
        let sender = self.sender.ok_or(ConfigError::MissingSender)?;

        if signer.ia() != self.config.local_ia {
            return Err(ConfigError::SignerMismatch {
                expected: self.config.local_ia,
                actual: signer.ia(),
            });
        }

        let snapshot = registry.snapshot();
        if snapshot.is_empty() {
            return Err(ConfigError::EmptyInterfaceSet);
        }
        if let Some(intf) = snapshot
            .iter()
            .find(|intf| intf.remote_ia == self.config.local_ia)
        {
            return Err(ConfigError::SelfLink(intf.ifid));
        }

        info!(
            local_ia = %self.config.local_ia,
            role = ?self.config.role,
            interfaces = snapshot.len(),
            mtu = self.config.mtu,
            "Beacon propagator ready"
        );

        Ok(Propagator {
            policy: AdmissionPolicy::from_config(&self.config),
            extender: Extender::from_config(&self.config, mac_key),
            config: self.config,
            signer,
            registry,
            provider,
            sender,
        })
    }
}
