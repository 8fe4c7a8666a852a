//! Error types for the serial channel.
//!
//! Serial problems never fail the diagnostic cycle. They are surfaced to the
//! operator as messages and the rest of the application stays usable.

use thiserror::Error;

/// Errors that can occur while detecting, opening, reading or closing a
/// serial sensor device.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialError {
    /// Serial access is not available on this platform or build.
    #[error("Serial access not supported: {0}")]
    Unsupported(String),

    /// The platform supports serial access but listing the ports failed.
    #[error("Failed to list serial ports: {0}")]
    Enumerate(String),

    /// Port detection succeeded but found nothing.
    #[error("No serial ports found")]
    NoPortsFound,

    /// Opening the port failed.
    #[error("Failed to connect: {0}")]
    Connect(String),

    /// Closing the port failed.
    #[error("Failed to disconnect: {0}")]
    Disconnect(String),

    /// Reading from an open port failed. Ends the read loop.
    #[error("Read error: {0}")]
    Read(String),

    /// A chunk did not parse as a JSON object. Logged and skipped.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl SerialError {
    /// Whether the error ends the read loop.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, SerialError::MalformedPayload(_))
    }
}
