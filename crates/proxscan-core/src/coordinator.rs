//! Scan coordination.
//!
//! The platform produces scan inventories asynchronously and delivers them
//! through a one-shot event on a thread of its choosing. [`ScanCoordinator`]
//! turns that into a single awaitable call:
//!
//! ```text
//! IDLE -> SCAN_REQUESTED -> (platform delivery) -> RESULT_READY -> IDLE
//! ```
//!
//! Every read or write of the coordinator state happens under one mutex that
//! is never held across an `.await` or a platform call. Waiting is done on a
//! per-cycle `watch` channel so a waiter only ever sees the result of the
//! cycle it started or joined.
//!
//! Each call gets one deadline when it starts. Platform queries run on the
//! blocking pool under that deadline, and the scan trigger is fired without
//! being awaited. A cycle carries its leader's deadline and is only abandoned
//! once that has passed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::spawn_blocking;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::platform::WifiPlatform;
use crate::sink::ScanSink;
use crate::types::{Association, ResultSet};

/// The cycle currently waiting for a platform delivery.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) cycle: u64,
    /// The leading call's deadline; past it the cycle is abandoned.
    pub(crate) deadline: Instant,
    pub(crate) done: watch::Sender<Option<ResultSet>>,
}

/// Mutable coordinator state, shared with the sink.
#[derive(Debug, Default)]
pub(crate) struct CoordinatorState {
    /// `Some([])` while a cycle is in flight; `Some(entries)` once delivered
    /// and not yet consumed.
    pub(crate) pending: Option<ResultSet>,
    pub(crate) ready: bool,
    /// Cycle the pending result was delivered for; `None` when unsolicited.
    pub(crate) pending_cycle: Option<u64>,
    /// Set by the first call that gets past the radio check, whether or not
    /// it ran a cycle, so the cold-start association shortcut fires at most
    /// once per coordinator.
    pub(crate) first_cycle_done: bool,
    pub(crate) in_flight: Option<InFlight>,
    pub(crate) cycles_started: u64,
}

impl CoordinatorState {
    /// Take a delivered result that no waiter is going to collect.
    fn consume_unsolicited(&mut self) -> Option<ResultSet> {
        if !self.ready || self.pending_cycle.is_some() {
            return None;
        }
        self.ready = false;
        self.pending.take()
    }

    /// Clear the result delivered for `cycle`, if it is still there.
    fn consume_cycle(&mut self, cycle: u64) {
        if self.ready && self.pending_cycle == Some(cycle) {
            self.ready = false;
            self.pending = None;
            self.pending_cycle = None;
        }
    }
}

/// State plus the platform handle, shared by the coordinator and its sinks.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) state: Mutex<CoordinatorState>,
    pub(crate) platform: Arc<dyn WifiPlatform>,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        // The state stays consistent across every early return, so a panic
        // elsewhere while holding the lock leaves nothing half-written.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// How a `scan` call is going to be answered.
enum Plan {
    Lead(u64, watch::Receiver<Option<ResultSet>>),
    Join(u64, watch::Receiver<Option<ResultSet>>),
    Answer(ResultSet),
    Fallback,
}

/// Coordinates scan requests against an asynchronously delivering platform.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct ScanCoordinator {
    shared: Arc<Shared>,
    wait_timeout: Duration,
}

impl ScanCoordinator {
    /// Create a coordinator over a platform.
    pub fn new(platform: Arc<dyn WifiPlatform>, config: &ScanConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(CoordinatorState::default()),
                platform,
            }),
            wait_timeout: config.wait_timeout(),
        }
    }

    /// The sink the platform must deliver scan completions to.
    #[must_use]
    pub fn sink(&self) -> ScanSink {
        ScanSink::new(Arc::clone(&self.shared))
    }

    /// The configured upper bound on a whole `scan` call.
    #[must_use]
    pub const fn wait_timeout(&self) -> Duration {
        self.wait_timeout
    }

    /// Request an inventory of nearby networks.
    ///
    /// With `request_fresh` a platform scan is started (or an in-flight one
    /// joined) and the call waits for its delivery. Without it, an unconsumed
    /// delivery or the current association is returned.
    ///
    /// The whole call, platform queries included, returns within
    /// [`wait_timeout`](Self::wait_timeout). Platform calls run on the
    /// blocking pool.
    ///
    /// Never fails: a disabled radio, a refused scan trigger or an expired
    /// wait all degrade to an empty or best-effort result.
    pub async fn scan(&self, request_fresh: bool) -> ResultSet {
        let deadline = Instant::now() + self.wait_timeout;

        let radio_enabled = self
            .platform_call(deadline, |platform| platform.radio_enabled())
            .await
            .unwrap_or(false);
        if !radio_enabled {
            debug!("Radio disabled, returning empty result");
            return ResultSet::new();
        }

        let first_call = !std::mem::replace(&mut self.shared.lock().first_cycle_done, true);
        if first_call {
            if let Some(association) = self.association(deadline).await {
                debug!(bssid = %association.bssid, "Cold start answered from current association");
                return vec![association.to_entry()];
            }
        }

        match self.plan(request_fresh, deadline) {
            Plan::Lead(cycle, rx) => {
                debug!(cycle, "Starting platform scan");
                self.trigger(cycle);
                self.wait(cycle, deadline, rx).await
            }
            Plan::Join(cycle, rx) => {
                debug!(cycle, "Joining in-flight scan");
                self.wait(cycle, deadline, rx).await
            }
            Plan::Answer(entries) => entries,
            Plan::Fallback => self
                .association(deadline)
                .await
                .map(|association| vec![association.to_entry()])
                .unwrap_or_default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn shared_state(&self) -> MutexGuard<'_, CoordinatorState> {
        self.shared.lock()
    }

    /// Run a platform query on the blocking pool, giving up at `deadline`.
    async fn platform_call<T, F>(&self, deadline: Instant, call: F) -> Option<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn WifiPlatform) -> T + Send + 'static,
    {
        let platform = Arc::clone(&self.shared.platform);
        match timeout_at(deadline, spawn_blocking(move || call(platform.as_ref()))).await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(e)) => {
                warn!(error = %e, "Platform call failed");
                None
            }
            Err(_) => {
                warn!("Platform call did not return before the scan deadline");
                None
            }
        }
    }

    async fn association(&self, deadline: Instant) -> Option<Association> {
        self.platform_call(deadline, |platform| platform.current_association())
            .await
            .flatten()
    }

    /// Ask the platform to scan. Not awaited: the cycle's wait is bounded
    /// on its own however long the trigger takes.
    fn trigger(&self, cycle: u64) {
        let platform = Arc::clone(&self.shared.platform);
        drop(spawn_blocking(move || {
            if !platform.start_scan() {
                warn!(cycle, "Platform refused to start a scan, waiting for a delivery anyway");
            }
        }));
    }

    fn plan(&self, request_fresh: bool, deadline: Instant) -> Plan {
        let mut state = self.shared.lock();

        // A cycle outliving its leader's deadline has no waiter left to abandon it.
        if state
            .in_flight
            .as_ref()
            .is_some_and(|f| f.deadline <= Instant::now())
        {
            debug!("Dropping expired scan cycle");
            state.in_flight = None;
            state.pending = None;
            state.ready = false;
        }

        if let Some(in_flight) = &state.in_flight {
            if request_fresh {
                return Plan::Join(in_flight.cycle, in_flight.done.subscribe());
            }
            return Plan::Fallback;
        }

        if request_fresh {
            state.cycles_started += 1;
            let cycle = state.cycles_started;
            let (done, rx) = watch::channel(None);
            state.pending = Some(ResultSet::new());
            state.ready = false;
            state.pending_cycle = None;
            state.in_flight = Some(InFlight {
                cycle,
                deadline,
                done,
            });
            return Plan::Lead(cycle, rx);
        }

        match state.consume_unsolicited() {
            Some(entries) if !entries.is_empty() => Plan::Answer(entries),
            _ => Plan::Fallback,
        }
    }

    async fn wait(
        &self,
        cycle: u64,
        deadline: Instant,
        mut rx: watch::Receiver<Option<ResultSet>>,
    ) -> ResultSet {
        let delivered = timeout_at(deadline, rx.wait_for(Option::is_some))
            .await
            .ok()
            .and_then(Result::ok)
            .and_then(|entries| entries.clone());

        let mut state = self.shared.lock();
        // The sink completes cycles under the state lock, so this also sees a
        // delivery that landed between the deadline and here.
        let Some(entries) = delivered.or_else(|| rx.borrow().clone()) else {
            // Only the cycle's own deadline abandons it; a joiner that came
            // with a shorter budget leaves it to the leader.
            let expired = state
                .in_flight
                .as_ref()
                .is_some_and(|f| f.cycle == cycle && f.deadline <= Instant::now());
            if expired {
                warn!(
                    cycle,
                    timeout_ms = u64::try_from(self.wait_timeout.as_millis()).unwrap_or(u64::MAX),
                    "Timed out waiting for scan results, abandoning cycle"
                );
                state.in_flight = None;
                state.ready = false;
                return state.pending.take().unwrap_or_default();
            }
            debug!(cycle, "Gave up on scan cycle before it completed");
            return ResultSet::new();
        };

        state.consume_cycle(cycle);
        debug!(cycle, count = entries.len(), "Scan cycle consumed");
        entries
    }
}

/// Poll a `scan(true)` future until its cycle is in flight and the platform
/// trigger has run, asserting it stays pending meanwhile.
#[cfg(test)]
pub(crate) async fn poll_until_triggered<F>(
    fut: &mut tokio_test::task::Spawn<F>,
    coordinator: &ScanCoordinator,
    scan_calls: impl Fn() -> usize,
) where
    F: std::future::Future<Output = ResultSet>,
{
    let before = scan_calls();
    for _ in 0..1_000 {
        tokio_test::assert_pending!(fut.poll());
        if coordinator.shared_state().in_flight.is_some() && scan_calls() > before {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("scan never reached the platform");
}
