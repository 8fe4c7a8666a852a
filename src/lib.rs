//! # amorticheck
//!
//! A diagnostic TUI and library for automotive shock absorbers.
//!
//! An operator picks a shock absorber profile and a manufacturer, then runs a
//! timed diagnostic cycle fed either by a serial sensor rig or by a built-in
//! simulator. Rolling sensor history is shown live, and the frozen result of a
//! completed cycle can be exported as a report.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│  cycle   │───▶│  data   │───▶│   ui     │  │
//! │  │ (state) │    │ (timers) │    │(aggreg.)│    │(ratatui) │  │
//! │  └─────────┘    └────┬─────┘    └─────────┘    └──────────┘  │
//! │                      │ CycleEvent                            │
//! │                 ┌────┴─────┐                                 │
//! │                 │  source  │◀── SimulatedSource | SerialSource│
//! │                 └──────────┘                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`catalog`]**: Static profiles, sensor channels, manufacturers and simulation bands
//! - **[`data`]**: Rolling per-channel aggregates, diagnostic results and the verdict rotation
//! - **[`cycle`]**: The [`DiagnosticCycle`] state machine and the tasks it owns
//! - **[`source`]**: The simulator and device-backed sources ([`ExternalSource`])
//! - **[`report`]**: Text and JSON reports of a completed cycle
//! - **[`config`]**: Layered [`Settings`]
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The terminal dashboard
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Interactive dashboard with the simulator
//! amorticheck
//!
//! # Read from a sensor rig
//! amorticheck --port /dev/ttyUSB0 --baud 9600
//!
//! # One reproducible simulated run, report as JSON
//! amorticheck --headless --seed 42 --profile regulable --format json
//! ```
//!
//! ### Aggregating readings
//!
//! ```
//! use amorticheck::catalog;
//! use amorticheck::SensorAggregator;
//!
//! let profile = catalog::profile("hidraulico").unwrap();
//! let mut aggregator = SensorAggregator::new(profile.channels);
//!
//! for value in [10.0, 20.0, 30.0] {
//!     aggregator.ingest("vibracion", value);
//! }
//!
//! let vibration = aggregator.get("vibracion").unwrap();
//! assert_eq!(vibration.min(), 10.0);
//! assert_eq!(vibration.max(), 30.0);
//! assert_eq!(vibration.average(), 20.0);
//! ```

pub mod app;
pub mod catalog;
pub mod config;
pub mod cycle;
pub mod data;
pub mod error;
pub mod events;
pub mod report;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use cycle::{CycleNotice, CycleState, CycleTiming, DiagnosticCycle};
pub use data::{DiagnosticResult, DiagnosticState, SensorAggregator, SensorReading, Verdict};
pub use error::SerialError;
pub use report::{Report, ReportFormat};
pub use source::{ExternalSource, SerialSource, SimulatedSource};
