//! Per-cycle cancellation and result aggregation.

use parking_lot::Mutex;
use shared_types::IfId;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::domain::BeaconId;
use crate::errors::{ExtendError, TransportError};

/// Cancellation signal and optional deadline for one cycle.
///
/// Checked before each beacon is drained, before each task is dispatched and
/// while awaiting completion.
#[derive(Clone, Debug)]
pub struct CycleContext {
    cancel: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Fires the cancellation signal of the contexts created with it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CycleContext {
    /// Cancellable context without a deadline.
    pub fn cancellable() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            Self {
                cancel: rx,
                deadline: None,
            },
        )
    }

    /// Context that is only ever bounded by a deadline, if one is added.
    pub fn background() -> Self {
        Self::cancellable().1
    }

    /// Context following an existing shutdown signal.
    pub fn from_shutdown(shutdown: watch::Receiver<bool>) -> Self {
        Self {
            cancel: shutdown,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves once the signal fires or the deadline passes.
    ///
    /// Never resolves if neither can happen (signal sender dropped, no deadline).
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        let signal = async move {
            loop {
                if *rx.borrow_and_update() {
                    return;
                }
                if rx.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }
}

/// Why a (beacon, egress) task failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Extension(ExtendError),
    Transport(TransportError),
}

/// A failed (beacon, egress) task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskFailure {
    pub beacon: BeaconId,
    pub egress: IfId,
    pub kind: FailureKind,
}

/// Aggregate outcome of one cycle.
///
/// `attempted` counts sends that were started. On return,
/// `attempted == succeeded + failed + abandoned`; tasks that cancellation
/// stopped before their send started are counted in `not_started` only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub beacons_received: usize,
    pub retrieval_faults: usize,
    pub ingress_rejected: usize,
    pub extension_faults: usize,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Sends still in flight when the cycle was cancelled.
    pub abandoned: usize,
    /// Extended beacons whose send was never started.
    pub not_started: usize,
    pub cancelled: bool,
    /// Distinct beacons delivered on at least one interface.
    pub propagated: usize,
    /// Egress interfaces that received at least one beacon.
    pub propagated_egress: BTreeSet<IfId>,
    pub failures: Vec<TaskFailure>,
}

impl CycleReport {
    /// True if every attempted task is accounted for.
    pub fn is_balanced(&self) -> bool {
        self.attempted == self.succeeded + self.failed + self.abandoned
    }
}

#[derive(Debug, Default)]
struct Outcomes {
    closed: bool,
    succeeded: usize,
    failed: usize,
    propagated: BTreeSet<BeaconId>,
    propagated_egress: BTreeSet<IfId>,
    failures: Vec<TaskFailure>,
}

/// Collects send outcomes from concurrent tasks.
///
/// Results recorded after [`Accumulator::close`] are discarded.
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    inner: Mutex<Outcomes>,
}

/// Snapshot of the accumulator taken when the cycle ends.
#[derive(Debug, Default)]
pub(crate) struct Settled {
    pub succeeded: usize,
    pub failed: usize,
    pub propagated: usize,
    pub propagated_egress: BTreeSet<IfId>,
    pub failures: Vec<TaskFailure>,
}

impl Accumulator {
    /// Returns false if the result arrived too late and was dropped.
    pub fn record(&self, beacon: BeaconId, egress: IfId, result: Result<(), TransportError>) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed {
            return false;
        }
        match result {
            Ok(()) => {
                inner.succeeded += 1;
                inner.propagated.insert(beacon);
                inner.propagated_egress.insert(egress);
            }
            Err(err) => {
                inner.failed += 1;
                inner.failures.push(TaskFailure {
                    beacon,
                    egress,
                    kind: FailureKind::Transport(err),
                });
            }
        }
        true
    }

    pub fn close(&self) -> Settled {
        let mut inner = self.inner.lock();
        inner.closed = true;
        Settled {
            succeeded: inner.succeeded,
            failed: inner.failed,
            propagated: inner.propagated.len(),
            propagated_egress: std::mem::take(&mut inner.propagated_egress),
            failures: std::mem::take(&mut inner.failures),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: BeaconId = BeaconId([1; 32]);

    #[test]
    fn test_accumulator_discards_late_results() {
        let acc = Accumulator::default();
        assert!(acc.record(ID, IfId(1), Ok(())));
        assert!(acc.record(ID, IfId(2), Err(TransportError::Timeout)));

        let settled = acc.close();
        assert_eq!(settled.succeeded, 1);
        assert_eq!(settled.failed, 1);
        assert_eq!(settled.propagated, 1);
        assert_eq!(settled.propagated_egress, BTreeSet::from([IfId(1)]));
        assert_eq!(settled.failures[0].kind, FailureKind::Transport(TransportError::Timeout));

        assert!(!acc.record(ID, IfId(3), Ok(())));
        assert_eq!(acc.close().succeeded, 1);
    }

    #[tokio::test]
    async fn test_cancel_handle_fires() {
        let (handle, ctx) = CycleContext::cancellable();
        assert!(!ctx.is_cancelled());
        handle.cancel();
        assert!(ctx.is_cancelled());
        ctx.cancelled().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let ctx = CycleContext::background().with_timeout(Duration::from_secs(5));
        assert!(!ctx.is_cancelled());
        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_without_deadline_never_fires() {
        let ctx = CycleContext::background();
        let fired = tokio::time::timeout(Duration::from_secs(60), ctx.cancelled()).await;
        assert!(fired.is_err());
    }

    #[test]
    fn test_earliest_deadline_wins() {
        let now = Instant::now();
        let ctx = CycleContext::background()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[test]
    fn test_report_balance() {
        let report = CycleReport {
            attempted: 3,
            succeeded: 1,
            failed: 1,
            abandoned: 1,
            ..Default::default()
        };
        assert!(report.is_balanced());
    }
}
