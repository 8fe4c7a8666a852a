//! Serial device source.
//!
//! Reads raw chunks from a byte stream, decodes each as a JSON object of
//! channel readings and forwards it to the cycle. The stream sits behind an
//! async mutex that the read loop holds for its whole lifetime, so aborting
//! the reader is what releases the device for closing.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{parse_payload, ExternalSource};
use crate::cycle::CycleEvent;
use crate::error::SerialError;

/// Baud rate used when nothing else is configured.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Size of a single read from the device.
const READ_CHUNK: usize = 1024;

/// How long `close` waits for a cancelled reader to let go of the device.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// A data source reading sensor payloads from a serial byte stream.
///
/// Each chunk returned by a single read is parsed independently; a chunk that
/// is not a complete JSON object is logged and discarded.
pub struct SerialSource<S> {
    port: Arc<Mutex<Option<S>>>,
    description: String,
}

impl<S> fmt::Debug for SerialSource<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerialSource").field("description", &self.description).finish()
    }
}

impl<S> SerialSource<S>
where
    S: AsyncRead + Unpin + Send + 'static,
{
    /// Wrap an already opened byte stream.
    pub fn new(port: S, description: &str) -> Self {
        Self {
            port: Arc::new(Mutex::new(Some(port))),
            description: format!("serial: {}", description),
        }
    }

    async fn read_loop(
        port: Arc<Mutex<Option<S>>>,
        generation: u64,
        events: mpsc::UnboundedSender<CycleEvent>,
    ) {
        // Held until the loop ends or the task is aborted
        let mut guard = port.lock().await;
        let Some(stream) = guard.as_mut() else {
            let _ = events.send(CycleEvent::SourceClosed { generation });
            return;
        };

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let outcome = match stream.read(&mut buf).await {
                Ok(0) => {
                    debug!(generation, "serial stream closed by device");
                    let _ = events.send(CycleEvent::SourceClosed { generation });
                    break;
                }
                Ok(n) => parse_payload(&String::from_utf8_lossy(&buf[..n])),
                Err(e) => Err(SerialError::Read(e.to_string())),
            };

            match outcome {
                Ok(readings) => {
                    if events.send(CycleEvent::Readings { generation, readings }).is_err() {
                        // Cycle dropped
                        break;
                    }
                }
                Err(error) if !error.is_fatal() => {
                    warn!(generation, error = %error, "discarding serial chunk");
                }
                Err(error) => {
                    warn!(generation, error = %error, "serial read loop stopped");
                    let _ = events.send(CycleEvent::SourceError { generation, error });
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl<S> ExternalSource for SerialSource<S>
where
    S: AsyncRead + Unpin + Send + 'static,
{
    fn description(&self) -> &str {
        &self.description
    }

    fn spawn_reader(
        &self,
        generation: u64,
        events: mpsc::UnboundedSender<CycleEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::read_loop(self.port.clone(), generation, events))
    }

    async fn close(self: Box<Self>) -> Result<(), SerialError> {
        let mut guard = tokio::time::timeout(CLOSE_TIMEOUT, self.port.lock())
            .await
            .map_err(|_| SerialError::Disconnect("reader still holds the port".to_string()))?;

        // Dropping the stream closes the device
        if guard.take().is_some() {
            info!(source = %self.description, "serial port closed");
        }
        Ok(())
    }
}

/// Names of the serial ports present on this machine.
#[cfg(feature = "serial")]
pub fn available_ports() -> Result<Vec<String>, SerialError> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| SerialError::Enumerate(e.to_string()))?;

    if ports.is_empty() {
        return Err(SerialError::NoPortsFound);
    }
    Ok(ports.into_iter().map(|p| p.port_name).collect())
}

/// Names of the serial ports present on this machine.
#[cfg(not(feature = "serial"))]
pub fn available_ports() -> Result<Vec<String>, SerialError> {
    Err(SerialError::Unsupported("built without the `serial` feature".to_string()))
}

/// Open `path` at `baud_rate`.
///
/// Must be called from within a tokio runtime.
#[cfg(feature = "serial")]
pub fn open(
    path: &str,
    baud_rate: u32,
) -> Result<SerialSource<tokio_serial::SerialStream>, SerialError> {
    use tokio_serial::SerialPortBuilderExt;

    let stream = tokio_serial::new(path, baud_rate)
        .open_native_async()
        .map_err(|e| SerialError::Connect(format!("{}: {}", path, e)))?;

    info!(path, baud_rate, "serial port opened");
    Ok(SerialSource::new(stream, &format!("{} @ {}", path, baud_rate)))
}

/// Open `path` at `baud_rate`.
#[cfg(not(feature = "serial"))]
pub fn open(path: &str, _baud_rate: u32) -> Result<SerialSource<tokio::io::Empty>, SerialError> {
    Err(SerialError::Unsupported(format!(
        "cannot open {}: built without the `serial` feature",
        path
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn sample_json() -> &'static str {
        r#"{"vibracion": 12.5, "presion": 40}"#
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<CycleEvent>) -> CycleEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_reader_forwards_payloads() {
        let (mut device, host) = tokio::io::duplex(1024);
        let source = SerialSource::new(host, "test");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reader = source.spawn_reader(3, tx);

        device.write_all(sample_json().as_bytes()).await.unwrap();

        match next_event(&mut rx).await {
            CycleEvent::Readings { generation, readings } => {
                assert_eq!(generation, 3);
                assert_eq!(readings["vibracion"], 12.5);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_chunk_does_not_end_loop() {
        let (mut device, host) = tokio::io::duplex(1024);
        let source = SerialSource::new(host, "test");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reader = source.spawn_reader(1, tx);

        device.write_all(b"{bad").await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());

        device.write_all(sample_json().as_bytes()).await.unwrap();
        assert!(matches!(next_event(&mut rx).await, CycleEvent::Readings { .. }));
    }

    #[tokio::test]
    async fn test_end_of_stream_is_reported() {
        let (device, host) = tokio::io::duplex(64);
        let source = SerialSource::new(host, "test");
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader = source.spawn_reader(7, tx);

        drop(device);

        assert_eq!(next_event(&mut rx).await, CycleEvent::SourceClosed { generation: 7 });
        reader.await.unwrap();
    }

    #[tokio::test]
    async fn test_close_after_abort_releases_port() {
        let (_device, host) = tokio::io::duplex(64);
        let source = SerialSource::new(host, "test");
        let (tx, _rx) = mpsc::unbounded_channel();
        let reader = source.spawn_reader(1, tx);

        tokio::time::sleep(Duration::from_millis(10)).await;
        reader.abort();

        assert_eq!(Box::new(source).close().await, Ok(()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_with_live_reader_times_out() {
        let (_device, host) = tokio::io::duplex(64);
        let source = SerialSource::new(host, "test");
        let (tx, _rx) = mpsc::unbounded_channel();
        let _reader = source.spawn_reader(1, tx);

        // Let the reader take the lock
        tokio::task::yield_now().await;

        let result = Box::new(source).close().await;
        assert!(matches!(result, Err(SerialError::Disconnect(_))));
    }

    #[tokio::test]
    async fn test_reader_after_close_reports_closed() {
        let (_device, host) = tokio::io::duplex(64);
        let source = SerialSource::new(host, "test");
        let port = source.port.clone();
        Box::new(source).close().await.unwrap();

        let reopened = SerialSource::<tokio::io::DuplexStream> {
            port,
            description: "serial: test".to_string(),
        };
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _reader = reopened.spawn_reader(2, tx);
        assert_eq!(next_event(&mut rx).await, CycleEvent::SourceClosed { generation: 2 });
    }

    #[tokio::test]
    async fn test_description() {
        let (_device, host) = tokio::io::duplex(64);
        let source = SerialSource::new(host, "/dev/ttyUSB0 @ 9600");
        assert_eq!(source.description(), "serial: /dev/ttyUSB0 @ 9600");
    }
}
