//! Sensor data models and aggregation.
//!
//! ## Submodules
//!
//! - [`aggregator`]: Rolling per-channel state for the active profile ([`SensorAggregator`])
//! - [`duration`]: Parsing of duration strings (e.g., "30s", "500ms") and countdown formatting
//! - [`reading`]: Bounded history and min/max/average of one channel ([`SensorReading`])
//! - [`verdict`]: Diagnostic states, results and the verdict rotation
//!
//! ## Data Flow
//!
//! ```text
//! device payload / simulator sample
//!        │
//!        ▼
//! SensorAggregator::ingest()
//!        │
//!        ├──▶ SensorReading (history ≤ 30, min/max, window average)
//!        │
//!        └──▶ frozen as the cycle snapshot on completion
//! ```

pub mod aggregator;
pub mod duration;
pub mod reading;
pub mod verdict;

pub use aggregator::{RawReadings, SensorAggregator};
pub use reading::{ReadingSummary, SensorReading, HISTORY_CAPACITY};
pub use verdict::{DiagnosticResult, DiagnosticState, Verdict, VerdictRotation};
