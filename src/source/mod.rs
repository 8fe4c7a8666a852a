//! Reading sources that feed the sensor aggregator.
//!
//! Two kinds of source exist:
//!
//! - [`SimulatedSource`]: synthetic readings, driven by the cycle's own
//!   timers and RNG.
//! - [`ExternalSource`] implementations such as [`SerialSource`]: a device
//!   read loop running as a background task, forwarding decoded payloads to
//!   the cycle as [`CycleEvent::Readings`].
//!
//! Only one of them is active during a cycle.

pub mod serial;
pub mod simulated;

pub use serial::SerialSource;
pub use simulated::SimulatedSource;

use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::cycle::CycleEvent;
use crate::data::RawReadings;
use crate::error::SerialError;

/// A device-backed source of raw readings.
///
/// The cycle spawns one reader per running generation and tracks the returned
/// handle; aborting that handle must stop reading and release the device.
///
/// # Example
///
/// ```
/// use amorticheck::source::{ExternalSource, SerialSource};
///
/// # tokio_test::block_on(async {
/// let (_device, host) = tokio::io::duplex(64);
/// let source = SerialSource::new(host, "bench rig");
/// assert_eq!(source.description(), "serial: bench rig");
/// # });
/// ```
#[async_trait]
pub trait ExternalSource: Send + Sync + Debug {
    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;

    /// Start the read loop for cycle `generation`.
    fn spawn_reader(
        &self,
        generation: u64,
        events: mpsc::UnboundedSender<CycleEvent>,
    ) -> JoinHandle<()>;

    /// Close the device. Any reader must have been aborted first.
    async fn close(self: Box<Self>) -> Result<(), SerialError>;
}

/// Decode one chunk as a JSON object of `{channelId: number}`.
///
/// Fields whose value is not a number are dropped.
pub fn parse_payload(text: &str) -> Result<RawReadings, SerialError> {
    let object: serde_json::Map<String, serde_json::Value> = serde_json::from_str(text.trim())
        .map_err(|e| SerialError::MalformedPayload(e.to_string()))?;

    Ok(object.into_iter().filter_map(|(key, value)| value.as_f64().map(|v| (key, v))).collect())
}
