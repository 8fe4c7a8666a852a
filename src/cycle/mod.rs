//! The diagnostic cycle state machine.
//!
//! A cycle is one timed run from start to verdict:
//!
//! ```text
//!            start()                 terminal timer
//!   Idle ───────────────▶ Running ───────────────────▶ Completed
//!    ▲                      │ ▲                           │
//!    │        stop()        │ │         start()           │
//!    └──────────────────────┘ └───────────────────────────┘
//!    ▲                                                    │
//!    └──────────────────────── stop() ────────────────────┘
//! ```
//!
//! All timers and the external reader run as background tasks that only send
//! [`CycleEvent`]s. The cycle applies them in [`DiagnosticCycle::poll`], so
//! all state changes happen on the caller's loop, one at a time.

mod event;
mod handle;
mod timing;

pub use event::{CycleEvent, CycleNotice};
pub use handle::CycleHandle;
pub use timing::CycleTiming;

use rand::rngs::StdRng;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::catalog::ShockAbsorberProfile;
use crate::data::verdict::{
    PROMPT_DESCRIPTION, STARTING_DESCRIPTION, STOPPED_DESCRIPTION, TESTING_DESCRIPTION,
};
use crate::data::{DiagnosticResult, SensorAggregator, Verdict, VerdictRotation};
use crate::source::simulated::{record_test, SimulatedSource};
use crate::source::ExternalSource;

/// Lifecycle state of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
    Completed,
}

impl CycleState {
    pub fn label(&self) -> &'static str {
        match self {
            CycleState::Idle => "Idle",
            CycleState::Running => "Running",
            CycleState::Completed => "Completed",
        }
    }
}

/// Orchestrates one diagnostic run at a time.
///
/// # Example
///
/// ```
/// use amorticheck::catalog;
/// use amorticheck::cycle::{CycleState, CycleTiming, DiagnosticCycle};
/// use rand::SeedableRng;
///
/// # tokio_test::block_on(async {
/// let profile = catalog::profile("hidraulico").unwrap();
/// let rng = rand::rngs::StdRng::seed_from_u64(7);
/// let mut cycle = DiagnosticCycle::new(profile, CycleTiming::default(), rng);
///
/// cycle.start();
/// assert_eq!(cycle.state(), CycleState::Running);
/// cycle.stop();
/// assert_eq!(cycle.state(), CycleState::Idle);
/// # });
/// ```
#[derive(Debug)]
pub struct DiagnosticCycle {
    profile: &'static ShockAbsorberProfile,
    timing: CycleTiming,
    state: CycleState,
    aggregator: SensorAggregator,
    result: DiagnosticResult,
    progress: u8,
    tests_performed: Vec<&'static str>,
    snapshot: Option<SensorAggregator>,
    rotation: VerdictRotation,
    rng: StdRng,
    simulator: Option<SimulatedSource>,
    external: Option<Box<dyn ExternalSource>>,
    handle: CycleHandle,
    generation: u64,
    started_at: Option<Instant>,
    events_tx: mpsc::UnboundedSender<CycleEvent>,
    events_rx: mpsc::UnboundedReceiver<CycleEvent>,
}

impl DiagnosticCycle {
    /// Create an idle cycle for `profile`.
    pub fn new(profile: &'static ShockAbsorberProfile, timing: CycleTiming, rng: StdRng) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            profile,
            timing,
            state: CycleState::Idle,
            aggregator: SensorAggregator::new(profile.channels),
            result: DiagnosticResult::default(),
            progress: 0,
            tests_performed: Vec::new(),
            snapshot: None,
            rotation: VerdictRotation::new(),
            rng,
            simulator: None,
            external: None,
            handle: CycleHandle::new(),
            generation: 0,
            started_at: None,
            events_tx,
            events_rx,
        }
    }

    /// Start a new cycle, cancelling and resetting any cycle in progress.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.state == CycleState::Running {
            debug!(generation = self.generation, "restarting running cycle");
        }
        self.teardown();

        self.aggregator.reset(self.profile.channels);
        self.tests_performed.clear();
        self.snapshot = None;
        self.progress = 0;
        self.result = DiagnosticResult::evaluating(STARTING_DESCRIPTION);
        self.state = CycleState::Running;
        self.started_at = Some(Instant::now());

        let generation = self.generation;
        let delay = self.simulation_delay();
        let tx = &self.events_tx;

        self.handle.every(self.timing.tick, tx, move |at| CycleEvent::Tick { generation, at });
        self.handle.after(delay, CycleEvent::SimulationStart { generation }, tx);
        self.handle.after(self.timing.duration, CycleEvent::Complete { generation }, tx);

        if let Some(source) = &self.external {
            self.handle.set_reader(source.spawn_reader(generation, tx.clone()));
        }

        info!(
            generation,
            profile = self.profile.id,
            delay_ms = delay.as_millis() as u64,
            external = self.external.is_some(),
            "diagnostic cycle started"
        );
    }

    /// Stop whatever is going on and return to Idle.
    ///
    /// Valid from any state.
    pub fn stop(&mut self) {
        let was = self.state;
        self.teardown();

        self.aggregator.reset(self.profile.channels);
        self.progress = 0;
        self.result = DiagnosticResult::unknown(STOPPED_DESCRIPTION);
        self.snapshot = None;
        self.state = CycleState::Idle;

        info!(from = was.label(), "diagnostic cycle stopped");
    }

    /// Cancel every task, invalidate queued events and drop the simulator.
    fn teardown(&mut self) {
        let cancelled = self.handle.cancel_all();
        self.generation += 1;
        while self.events_rx.try_recv().is_ok() {}
        self.simulator = None;
        self.started_at = None;
        if cancelled > 0 {
            debug!(cancelled, "cancelled cycle tasks");
        }
    }

    fn simulation_delay(&mut self) -> std::time::Duration {
        let (min, max) = (self.timing.simulation_delay_min, self.timing.simulation_delay_max);
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Apply every queued event.
    ///
    /// Returns what happened, in order.
    pub fn poll(&mut self) -> Vec<CycleNotice> {
        let mut notices = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if event.generation() != self.generation {
                continue;
            }
            if let Some(notice) = self.apply(event) {
                notices.push(notice);
            }
        }
        notices
    }

    fn apply(&mut self, event: CycleEvent) -> Option<CycleNotice> {
        if self.state != CycleState::Running {
            return None;
        }

        match event {
            CycleEvent::Tick { at, .. } => {
                if let Some(started) = self.started_at {
                    let progress = self.timing.progress(at.saturating_duration_since(started));
                    self.progress = self.progress.max(progress);
                }
                None
            }
            CycleEvent::SimulationStart { .. } => {
                self.result = DiagnosticResult::evaluating(TESTING_DESCRIPTION);
                if self.external.is_some() {
                    debug!("external source attached, simulator not started");
                    return Some(CycleNotice::TestingStarted { band: None });
                }
                let band = self.start_simulation();
                Some(CycleNotice::TestingStarted { band: Some(band) })
            }
            CycleEvent::SimulationSample { .. } => {
                let simulator = self.simulator.as_mut()?;
                for (id, value) in simulator.step(&mut self.rng) {
                    self.aggregator.ingest(id, value);
                }
                None
            }
            CycleEvent::TestPick { .. } => {
                let test = self.simulator.as_ref()?.pick_test(&mut self.rng)?;
                if record_test(&mut self.tests_performed, test) {
                    debug!(test, "test performed");
                    Some(CycleNotice::TestPerformed(test))
                } else {
                    None
                }
            }
            CycleEvent::Complete { .. } => Some(CycleNotice::Completed(self.complete())),
            CycleEvent::Readings { readings, .. } => {
                let recorded = self.aggregator.ingest_all(&readings);
                if recorded < readings.len() {
                    debug!(recorded, received = readings.len(), "skipped unknown channels");
                }
                None
            }
            CycleEvent::SourceError { error, .. } => {
                warn!(error = %error, "external source failed");
                self.handle.release_reader();
                Some(CycleNotice::SourceError(error))
            }
            CycleEvent::SourceClosed { .. } => {
                info!("external source closed its stream");
                self.handle.release_reader();
                Some(CycleNotice::SourceClosed)
            }
        }
    }

    fn start_simulation(&mut self) -> usize {
        let simulator = SimulatedSource::activate(self.profile, &mut self.rng);
        for (id, value) in simulator.seeds() {
            self.aggregator.seed(id, value);
        }
        let band = simulator.band();
        self.simulator = Some(simulator);

        let generation = self.generation;
        self.handle.simulate_every(self.timing.sample_interval, &self.events_tx, move |_| {
            CycleEvent::SimulationSample { generation }
        });
        self.handle.simulate_every(self.timing.test_interval, &self.events_tx, move |_| {
            CycleEvent::TestPick { generation }
        });

        info!(generation, band, "simulator started");
        band
    }

    /// Freeze the snapshot, pick the verdict and stop all tasks.
    fn complete(&mut self) -> Verdict {
        self.snapshot = Some(self.aggregator.clone());
        let verdict = self.rotation.advance();
        self.result = DiagnosticResult::verdict(verdict);
        self.handle.cancel_all();
        self.simulator = None;
        self.progress = 100;
        self.state = CycleState::Completed;

        info!(generation = self.generation, ?verdict, "diagnostic cycle completed");
        verdict
    }

    /// Switch to another profile.
    ///
    /// Rejected (returns `false`) while a cycle is running. A completed
    /// cycle's snapshot is discarded.
    pub fn set_profile(&mut self, profile: &'static ShockAbsorberProfile) -> bool {
        if self.state == CycleState::Running {
            return false;
        }
        self.teardown();
        self.profile = profile;
        self.aggregator.reset(profile.channels);
        self.tests_performed.clear();
        self.snapshot = None;
        self.progress = 0;
        self.result = DiagnosticResult::unknown(PROMPT_DESCRIPTION);
        self.state = CycleState::Idle;
        true
    }

    /// Attach a device source. A running cycle starts reading immediately.
    ///
    /// If the simulator is already producing, the device takes over: the
    /// simulator stops and its readings and tests are discarded, so the cycle
    /// only ever aggregates one source. Any previously attached source is
    /// returned so it can be closed.
    pub fn attach_source(
        &mut self,
        source: Box<dyn ExternalSource>,
    ) -> Option<Box<dyn ExternalSource>> {
        let previous = self.detach_source();
        if self.state == CycleState::Running {
            if self.simulator.take().is_some() {
                let cancelled = self.handle.stop_simulation();
                self.aggregator.reset(self.profile.channels);
                self.tests_performed.clear();
                info!(cancelled, "simulator stopped, device takes over");
            }
            self.handle.set_reader(source.spawn_reader(self.generation, self.events_tx.clone()));
        }
        info!(source = source.description(), "external source attached");
        self.external = Some(source);
        previous
    }

    /// Detach the device source, cancelling its read loop.
    pub fn detach_source(&mut self) -> Option<Box<dyn ExternalSource>> {
        self.handle.release_reader();
        let source = self.external.take();
        if let Some(ref source) = source {
            info!(source = source.description(), "external source detached");
        }
        source
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == CycleState::Running
    }

    pub fn profile(&self) -> &'static ShockAbsorberProfile {
        self.profile
    }

    pub fn timing(&self) -> &CycleTiming {
        &self.timing
    }

    pub fn aggregator(&self) -> &SensorAggregator {
        &self.aggregator
    }

    pub fn result(&self) -> &DiagnosticResult {
        &self.result
    }

    /// Progress percentage of the running cycle (0-100).
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Time since the running cycle started.
    pub fn elapsed(&self) -> Option<std::time::Duration> {
        self.started_at.map(|s| s.elapsed())
    }

    pub fn tests_performed(&self) -> &[&'static str] {
        &self.tests_performed
    }

    /// Aggregates frozen when the last cycle completed.
    pub fn snapshot(&self) -> Option<&SensorAggregator> {
        self.snapshot.as_ref()
    }

    pub fn rotation(&self) -> VerdictRotation {
        self.rotation
    }

    pub fn simulation_active(&self) -> bool {
        self.simulator.is_some()
    }

    pub fn external_source(&self) -> Option<&dyn ExternalSource> {
        self.external.as_deref()
    }

    /// Number of background tasks currently tracked for this cycle.
    pub fn pending_tasks(&self) -> usize {
        self.handle.tracked()
    }
}
