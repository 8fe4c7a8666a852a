//! Layered application settings.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, `AMORTICHECK_*` environment variables, then command-line flags
//! (applied by the binary).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::report::ReportFormat;
use crate::source::serial::DEFAULT_BAUD_RATE;

/// Prefix of environment overrides, e.g. `AMORTICHECK_SERIAL__BAUD_RATE`.
pub const ENV_PREFIX: &str = "AMORTICHECK";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub serial: SerialSettings,
    pub cycle: CycleSettings,
    pub simulation: SimulationSettings,
    pub report: ReportSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Port to connect to at startup.
    pub port: Option<String>,
    pub baud_rate: u32,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Cycle timers as duration strings ("30s", "500ms").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleSettings {
    pub duration: String,
    pub tick: String,
    pub simulation_delay_min: String,
    pub simulation_delay_max: String,
    pub sample_interval: String,
    pub test_interval: String,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            duration: "30s".to_string(),
            tick: "100ms".to_string(),
            simulation_delay_min: "10s".to_string(),
            simulation_delay_max: "15s".to_string(),
            sample_interval: "500ms".to_string(),
            test_interval: "5s".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Fixed RNG seed; entropy when unset.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Directory exported reports are written to.
    pub dir: PathBuf,
    pub format: ReportFormat,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            format: ReportFormat::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log file used while the TUI owns the terminal.
    pub file: PathBuf,
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from("amorticheck.log"),
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from defaults, `path` (if given) and the environment.
    ///
    /// A missing file at an explicitly given path is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&Settings::default()).context("invalid default settings")?);

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| match path {
                Some(p) => format!("failed to load settings from {}", p.display()),
                None => "failed to load settings".to_string(),
            })?;

        config.try_deserialize().context("invalid settings")
    }
}
