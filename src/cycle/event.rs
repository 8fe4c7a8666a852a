//! Messages sent from timer and reader tasks to the cycle owner.

use tokio::time::Instant;

use crate::data::{RawReadings, Verdict};
use crate::error::SerialError;

/// Something a background task wants the cycle to act on.
///
/// Every event carries the generation of the cycle that scheduled it. Events
/// from an older generation are dropped unseen.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleEvent {
    /// Progress timer fired.
    Tick { generation: u64, at: Instant },
    /// Randomized delayed trigger fired.
    SimulationStart { generation: u64 },
    /// Simulator sample interval fired.
    SimulationSample { generation: u64 },
    /// Simulator test-pick interval fired.
    TestPick { generation: u64 },
    /// Terminal timer fired.
    Complete { generation: u64 },
    /// An external device delivered a decoded payload.
    Readings {
        generation: u64,
        readings: RawReadings,
    },
    /// The external read loop failed and stopped.
    SourceError { generation: u64, error: SerialError },
    /// The external device signalled end of stream.
    SourceClosed { generation: u64 },
}

impl CycleEvent {
    pub fn generation(&self) -> u64 {
        match self {
            CycleEvent::Tick { generation, .. }
            | CycleEvent::SimulationStart { generation }
            | CycleEvent::SimulationSample { generation }
            | CycleEvent::TestPick { generation }
            | CycleEvent::Complete { generation }
            | CycleEvent::Readings { generation, .. }
            | CycleEvent::SourceError { generation, .. }
            | CycleEvent::SourceClosed { generation } => *generation,
        }
    }
}

/// Outcome of processing events, reported back to the caller of `poll`.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleNotice {
    /// The delayed trigger fired; `band` is set when the simulator took over.
    TestingStarted { band: Option<usize> },
    /// A new test name was added to the performed list.
    TestPerformed(&'static str),
    /// The terminal timer fired and the snapshot was frozen.
    Completed(Verdict),
    /// The external read loop stopped with an error.
    SourceError(SerialError),
    /// The external device closed its stream.
    SourceClosed,
}
