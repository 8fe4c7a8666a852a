use std::time::Duration;

use anyhow::{bail, Result};

use crate::config::CycleSettings;
use crate::data::duration::parse_duration;

/// Timer parameters of a diagnostic cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTiming {
    /// When the terminal timer fires.
    pub duration: Duration,
    /// Progress recomputation interval.
    pub tick: Duration,
    /// Lower bound (inclusive) of the randomized testing trigger.
    pub simulation_delay_min: Duration,
    /// Upper bound (exclusive) of the randomized testing trigger.
    pub simulation_delay_max: Duration,
    /// Simulator sample interval.
    pub sample_interval: Duration,
    /// Simulator test-pick interval.
    pub test_interval: Duration,
}

impl Default for CycleTiming {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(30),
            tick: Duration::from_millis(100),
            simulation_delay_min: Duration::from_secs(10),
            simulation_delay_max: Duration::from_secs(15),
            sample_interval: Duration::from_millis(500),
            test_interval: Duration::from_secs(5),
        }
    }
}

impl CycleTiming {
    /// Build from configuration strings, validating the result.
    pub fn from_settings(settings: &CycleSettings) -> Result<Self> {
        let timing = Self {
            duration: parse_duration(&settings.duration)?,
            tick: parse_duration(&settings.tick)?,
            simulation_delay_min: parse_duration(&settings.simulation_delay_min)?,
            simulation_delay_max: parse_duration(&settings.simulation_delay_max)?,
            sample_interval: parse_duration(&settings.sample_interval)?,
            test_interval: parse_duration(&settings.test_interval)?,
        };
        timing.validate()?;
        Ok(timing)
    }

    fn validate(&self) -> Result<()> {
        if self.duration.is_zero() {
            bail!("cycle duration must be positive");
        }
        for (name, period) in [
            ("tick", self.tick),
            ("sample_interval", self.sample_interval),
            ("test_interval", self.test_interval),
        ] {
            if period.is_zero() {
                bail!("{} must be positive", name);
            }
        }
        if self.simulation_delay_min > self.simulation_delay_max {
            bail!(
                "simulation_delay_min ({:?}) exceeds simulation_delay_max ({:?})",
                self.simulation_delay_min,
                self.simulation_delay_max
            );
        }
        Ok(())
    }

    /// Progress percentage (0-100) after `elapsed`.
    pub fn progress(&self, elapsed: Duration) -> u8 {
        let ratio = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (ratio * 100.0).min(100.0).round() as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress() {
        let timing = CycleTiming::default();
        assert_eq!(timing.progress(Duration::ZERO), 0);
        assert_eq!(timing.progress(Duration::from_millis(100)), 0);
        assert_eq!(timing.progress(Duration::from_secs(15)), 50);
        assert_eq!(timing.progress(Duration::from_millis(29_800)), 99);
        assert_eq!(timing.progress(Duration::from_millis(29_900)), 100);
        assert_eq!(timing.progress(Duration::from_secs(30)), 100);
        assert_eq!(timing.progress(Duration::from_secs(90)), 100);
    }

    #[test]
    fn test_from_default_settings() {
        let timing = CycleTiming::from_settings(&CycleSettings::default()).unwrap();
        assert_eq!(timing, CycleTiming::default());
    }

    #[test]
    fn test_rejects_inverted_delay() {
        let settings = CycleSettings {
            simulation_delay_min: "20s".to_string(),
            ..CycleSettings::default()
        };
        assert!(CycleTiming::from_settings(&settings).is_err());
    }

    #[test]
    fn test_rejects_zero_tick() {
        let settings = CycleSettings {
            tick: "0ms".to_string(),
            ..CycleSettings::default()
        };
        assert!(CycleTiming::from_settings(&settings).is_err());
    }
}
