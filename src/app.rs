//! Application state and user actions.

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::catalog::{
    ManufacturerStandard, ShockAbsorberProfile, DEFAULT_MANUFACTURER, DEFAULT_PROFILE,
    MANUFACTURERS, PROFILES,
};
use crate::config::Settings;
use crate::cycle::{CycleNotice, CycleState, CycleTiming, DiagnosticCycle};
use crate::error::SerialError;
use crate::report::Report;
use crate::source::{serial, ExternalSource};
use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: std::time::Duration = std::time::Duration::from_secs(3);

/// Connection state of the serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialStatus {
    Disconnected,
    /// Attached to the cycle; holds the source description.
    Connected(String),
    /// Detached and being closed in the background.
    Closing,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub show_help: bool,
    pub show_sensor_table: bool,

    pub cycle: DiagnosticCycle,
    pub profile_index: usize,
    pub manufacturer_index: usize,

    // Serial device
    pub ports: Vec<String>,
    pub selected_port: usize,
    pub serial_status: SerialStatus,
    pub serial_error: Option<SerialError>,
    closed_tx: mpsc::UnboundedSender<Result<(), SerialError>>,
    closed_rx: mpsc::UnboundedReceiver<Result<(), SerialError>>,

    pub settings: Settings,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, std::time::Instant)>,
}

impl App {
    /// Create the app with the default profile and manufacturer selected.
    pub fn new(settings: Settings, theme: Theme) -> Result<Self> {
        let timing = CycleTiming::from_settings(&settings.cycle)?;
        let rng = match settings.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let profile_index = PROFILES.iter().position(|p| p.id == DEFAULT_PROFILE).unwrap_or(0);
        let manufacturer_index =
            MANUFACTURERS.iter().position(|m| m.id == DEFAULT_MANUFACTURER).unwrap_or(0);
        let (closed_tx, closed_rx) = mpsc::unbounded_channel();

        Ok(Self {
            running: true,
            show_help: false,
            show_sensor_table: false,
            cycle: DiagnosticCycle::new(&PROFILES[profile_index], timing, rng),
            profile_index,
            manufacturer_index,
            ports: Vec::new(),
            selected_port: 0,
            serial_status: SerialStatus::Disconnected,
            serial_error: None,
            closed_tx,
            closed_rx,
            settings,
            theme,
            status_message: None,
        })
    }

    pub fn profile(&self) -> &'static ShockAbsorberProfile {
        self.cycle.profile()
    }

    pub fn manufacturer(&self) -> &'static ManufacturerStandard {
        &MANUFACTURERS[self.manufacturer_index]
    }

    /// Returns a description of where readings come from.
    pub fn source_description(&self) -> &str {
        match self.cycle.external_source() {
            Some(source) => source.description(),
            None => "simulator",
        }
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, std::time::Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < STATUS_MESSAGE_TTL {
                return Some(msg);
            }
        }
        None
    }

    /// Start a cycle if none is running, stop it otherwise.
    pub fn toggle_cycle(&mut self) {
        if self.cycle.is_running() {
            self.cycle.stop();
            self.set_status_message("Diagnosis stopped".to_string());
        } else {
            self.cycle.start();
            self.set_status_message(format!(
                "Diagnosing {} ({})",
                self.profile().name,
                self.source_description()
            ));
        }
    }

    fn selection_locked(&mut self) -> bool {
        if self.cycle.is_running() {
            self.set_status_message("Selection is locked while a diagnosis runs".to_string());
            return true;
        }
        false
    }

    fn apply_profile(&mut self, index: usize) {
        if self.cycle.set_profile(&PROFILES[index]) {
            self.profile_index = index;
            info!(profile = PROFILES[index].id, "profile selected");
        }
    }

    pub fn next_profile(&mut self) {
        if self.selection_locked() {
            return;
        }
        self.apply_profile((self.profile_index + 1) % PROFILES.len());
    }

    pub fn prev_profile(&mut self) {
        if self.selection_locked() {
            return;
        }
        self.apply_profile((self.profile_index + PROFILES.len() - 1) % PROFILES.len());
    }

    pub fn next_manufacturer(&mut self) {
        if self.selection_locked() {
            return;
        }
        self.manufacturer_index = (self.manufacturer_index + 1) % MANUFACTURERS.len();
    }

    pub fn prev_manufacturer(&mut self) {
        if self.selection_locked() {
            return;
        }
        self.manufacturer_index =
            (self.manufacturer_index + MANUFACTURERS.len() - 1) % MANUFACTURERS.len();
    }

    /// Select a profile by id (e.g. from the command line).
    pub fn select_profile(&mut self, id: &str) -> Result<()> {
        let index = PROFILES
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| anyhow!("unknown profile '{}'", id))?;
        if self.cycle.is_running() {
            return Err(anyhow!("cannot change profile while a diagnosis runs"));
        }
        self.apply_profile(index);
        Ok(())
    }

    /// Select a manufacturer by id (e.g. from the command line).
    pub fn select_manufacturer(&mut self, id: &str) -> Result<()> {
        let index = MANUFACTURERS
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| anyhow!("unknown manufacturer '{}'", id))?;
        if self.cycle.is_running() {
            return Err(anyhow!("cannot change manufacturer while a diagnosis runs"));
        }
        self.manufacturer_index = index;
        Ok(())
    }

    pub fn toggle_sensor_table(&mut self) {
        self.show_sensor_table = !self.show_sensor_table;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    fn report_serial_error(&mut self, error: SerialError) {
        warn!(error = %error, "serial error");
        self.set_status_message(error.to_string());
        self.serial_error = Some(error);
    }

    /// Refresh the list of serial ports.
    pub fn detect_ports(&mut self) {
        match serial::available_ports() {
            Ok(ports) => {
                info!(count = ports.len(), "serial ports detected");
                self.set_status_message(format!("{} serial port(s) found", ports.len()));
                self.ports = ports;
                self.selected_port = 0;
                self.serial_error = None;
            }
            Err(e) => {
                self.ports.clear();
                self.selected_port = 0;
                self.report_serial_error(e);
            }
        }
    }

    pub fn select_next_port(&mut self) {
        if !self.ports.is_empty() {
            self.selected_port = (self.selected_port + 1).min(self.ports.len() - 1);
        }
    }

    pub fn select_prev_port(&mut self) {
        self.selected_port = self.selected_port.saturating_sub(1);
    }

    /// The port `connect` would open: the highlighted one, else the configured one.
    pub fn target_port(&self) -> Option<&str> {
        self.ports
            .get(self.selected_port)
            .map(String::as_str)
            .or(self.settings.serial.port.as_deref())
    }

    /// Open the target port and attach it to the cycle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) {
        let Some(port) = self.target_port().map(str::to_string) else {
            self.report_serial_error(SerialError::NoPortsFound);
            return;
        };
        match serial::open(&port, self.settings.serial.baud_rate) {
            Ok(source) => self.attach_source(Box::new(source)),
            Err(e) => self.report_serial_error(e),
        }
    }

    /// Attach an already opened device source, closing any previous one.
    pub fn attach_source(&mut self, source: Box<dyn ExternalSource>) {
        let description = source.description().to_string();
        if let Some(previous) = self.cycle.attach_source(source) {
            self.close_in_background(previous);
        }
        self.serial_error = None;
        self.set_status_message(format!("Connected to {}", description));
        self.serial_status = SerialStatus::Connected(description);
    }

    /// Detach the device and close it in the background.
    ///
    /// The outcome is picked up by [`App::tick`].
    pub fn disconnect(&mut self) {
        match self.cycle.detach_source() {
            Some(source) => {
                self.serial_status = SerialStatus::Closing;
                self.close_in_background(source);
            }
            None => self.set_status_message("No device connected".to_string()),
        }
    }

    fn close_in_background(&self, source: Box<dyn ExternalSource>) {
        let closed = self.closed_tx.clone();
        tokio::spawn(async move {
            let _ = closed.send(source.close().await);
        });
    }

    /// Build a report from the last completed cycle.
    pub fn build_report(&self, date: chrono::NaiveDate) -> Option<Report> {
        let snapshot = self.cycle.snapshot()?;
        Some(Report::build(
            self.profile(),
            self.manufacturer(),
            self.cycle.result(),
            self.cycle.tests_performed(),
            snapshot,
            date,
        ))
    }

    /// Write the report for the last completed cycle into the report directory.
    pub fn export_report(&mut self) -> Result<PathBuf> {
        let today = chrono::Local::now().date_naive();
        let report = self
            .build_report(today)
            .ok_or_else(|| anyhow!("no completed diagnosis to export"))?;
        let path = report.write(&self.settings.report.dir, self.settings.report.format)?;
        info!(path = %path.display(), "report exported");
        Ok(path)
    }

    /// Apply pending cycle events and background results.
    ///
    /// Call this regularly from the UI loop.
    pub fn tick(&mut self) {
        for notice in self.cycle.poll() {
            match notice {
                CycleNotice::TestingStarted { band: Some(_) } => {
                    self.set_status_message("Simulated sensors online".to_string());
                }
                CycleNotice::TestingStarted { band: None } => {}
                CycleNotice::TestPerformed(test) => {
                    self.set_status_message(format!("Test performed: {}", test));
                }
                CycleNotice::Completed(verdict) => {
                    self.set_status_message(format!(
                        "Diagnosis complete: {} (e:export)",
                        verdict.state().label()
                    ));
                }
                CycleNotice::SourceError(e) => self.report_serial_error(e),
                CycleNotice::SourceClosed => {
                    self.set_status_message("Device closed the connection".to_string());
                }
            }
        }

        while let Ok(result) = self.closed_rx.try_recv() {
            if self.serial_status == SerialStatus::Closing {
                self.serial_status = SerialStatus::Disconnected;
            }
            match result {
                Ok(()) => self.set_status_message("Serial port closed".to_string()),
                Err(e) => self.report_serial_error(e),
            }
        }
    }

    pub fn cycle_state(&self) -> CycleState {
        self.cycle.state()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::data::DiagnosticState;
    use crate::source::SerialSource;

    fn app() -> App {
        let mut settings = Settings::default();
        settings.simulation.seed = Some(17);
        App::new(settings, Theme::dark()).unwrap()
    }

    #[tokio::test]
    async fn test_defaults() {
        let app = app();
        assert_eq!(app.profile().id, DEFAULT_PROFILE);
        assert_eq!(app.manufacturer().id, DEFAULT_MANUFACTURER);
        assert_eq!(app.source_description(), "simulator");
        assert_eq!(app.cycle_state(), CycleState::Idle);
        assert_eq!(app.serial_status, SerialStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selectors_locked_while_running() {
        let mut app = app();
        app.toggle_cycle();
        assert_eq!(app.cycle_state(), CycleState::Running);

        let (profile, manufacturer) = (app.profile_index, app.manufacturer_index);
        app.next_profile();
        app.prev_manufacturer();
        assert_eq!(app.profile_index, profile);
        assert_eq!(app.manufacturer_index, manufacturer);
        assert!(app.select_profile("regulable").is_err());

        app.toggle_cycle();
        assert_eq!(app.cycle_state(), CycleState::Idle);
        app.next_profile();
        assert_ne!(app.profile_index, profile);
        assert_eq!(app.cycle.aggregator().len(), app.profile().channels.len());
    }

    #[tokio::test]
    async fn test_select_by_id() {
        let mut app = app();
        app.select_profile("regulable").unwrap();
        app.select_manufacturer("sachs").unwrap();
        assert_eq!(app.profile().id, "regulable");
        assert_eq!(app.manufacturer().id, "sachs");
        assert!(app.select_profile("pneumatic").is_err());
        assert!(app.select_manufacturer("acme").is_err());
    }

    #[tokio::test]
    async fn test_selectors_wrap_around() {
        let mut app = app();
        for _ in 0..PROFILES.len() {
            app.next_profile();
        }
        assert_eq!(app.profile().id, DEFAULT_PROFILE);
        app.prev_manufacturer();
        assert_eq!(app.manufacturer_index, MANUFACTURERS.len() - 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_export_requires_completed_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.settings.report.dir = dir.path().to_path_buf();

        assert!(app.export_report().is_err());

        app.toggle_cycle();
        sleep(Duration::from_millis(30_100)).await;
        app.tick();
        assert_eq!(app.cycle_state(), CycleState::Completed);
        assert_eq!(app.cycle.result().state, DiagnosticState::Optimal);

        let path = app.export_report().unwrap();
        assert!(path.starts_with(dir.path()));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("OPTIMAL"));

        // A profile change discards the snapshot
        app.next_profile();
        assert!(app.export_report().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_without_ports_reports_error() {
        let mut app = app();
        app.connect();
        assert_eq!(app.serial_error, Some(SerialError::NoPortsFound));
        assert_eq!(app.serial_status, SerialStatus::Disconnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_and_disconnect_device() {
        let (_device, host) = tokio::io::duplex(256);
        let mut app = app();
        app.attach_source(Box::new(SerialSource::new(host, "rig")));
        assert_eq!(app.serial_status, SerialStatus::Connected("serial: rig".to_string()));
        assert_eq!(app.source_description(), "serial: rig");

        app.toggle_cycle();
        sleep(Duration::from_millis(50)).await;
        app.tick();

        app.disconnect();
        assert_eq!(app.serial_status, SerialStatus::Closing);
        assert_eq!(app.source_description(), "simulator");

        sleep(Duration::from_millis(50)).await;
        app.tick();
        assert_eq!(app.serial_status, SerialStatus::Disconnected);
        assert!(app.serial_error.is_none());
        assert_eq!(app.cycle_state(), CycleState::Running);
    }

    #[tokio::test]
    async fn test_disconnect_without_device() {
        let mut app = app();
        app.disconnect();
        assert_eq!(app.get_status_message(), Some("No device connected"));
        assert_eq!(app.serial_status, SerialStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_port_selection_is_clamped() {
        let mut app = app();
        app.select_next_port();
        assert_eq!(app.selected_port, 0);

        app.ports = vec!["/dev/ttyUSB0".to_string(), "/dev/ttyUSB1".to_string()];
        app.select_next_port();
        app.select_next_port();
        assert_eq!(app.target_port(), Some("/dev/ttyUSB1"));
        app.select_prev_port();
        app.select_prev_port();
        assert_eq!(app.target_port(), Some("/dev/ttyUSB0"));
    }
}
