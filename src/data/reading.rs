//! Per-channel rolling sensor state.

use std::collections::VecDeque;

use serde::Serialize;

/// Maximum number of past values kept per channel.
pub const HISTORY_CAPACITY: usize = 30;

/// Runtime state of one sensor channel.
///
/// Values are kept at full precision. [`SensorReading::summary`] gives the
/// two-decimal figures used for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReading {
    current: f64,
    history: VecDeque<f64>,
    /// Running (min, max) since the last reset or seed.
    extremes: Option<(f64, f64)>,
    average: f64,
}

/// Display figures for one channel, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadingSummary {
    pub current: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
}

impl SensorReading {
    /// Create an empty reading (all zero, no history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, evicting the oldest past [`HISTORY_CAPACITY`].
    ///
    /// Non-finite values are ignored. Returns whether the value was recorded.
    pub fn record(&mut self, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }

        self.current = value;
        self.history.push_back(value);
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }

        self.extremes = Some(match self.extremes {
            Some((min, max)) => (min.min(value), max.max(value)),
            None => (value, value),
        });

        self.average = self.history.iter().sum::<f64>() / self.history.len() as f64;
        true
    }

    /// Restart the channel at `value` with an empty history.
    pub fn seed(&mut self, value: f64) {
        self.history.clear();
        self.current = value;
        self.extremes = Some((value, value));
        self.average = value;
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn min(&self) -> f64 {
        self.extremes.map_or(0.0, |(min, _)| min)
    }

    pub fn max(&self) -> f64 {
        self.extremes.map_or(0.0, |(_, max)| max)
    }

    pub fn average(&self) -> f64 {
        self.average
    }

    /// Past values, oldest first.
    pub fn history(&self) -> &VecDeque<f64> {
        &self.history
    }

    /// Two-decimal display figures.
    pub fn summary(&self) -> ReadingSummary {
        ReadingSummary {
            current: round2(self.current),
            min: round2(self.min()),
            max: round2(self.max()),
            average: round2(self.average),
        }
    }

    /// Sparkline levels (0-7) for the history, scaled to `[lower, upper]`.
    ///
    /// Returns an empty Vec if there's nothing recorded yet.
    pub fn sparkline(&self, lower: f64, upper: f64) -> Vec<u8> {
        if self.history.is_empty() {
            return Vec::new();
        }

        let range = (upper - lower).max(f64::EPSILON);
        self.history
            .iter()
            .map(|&v| {
                let normalized = ((v - lower) / range * 7.0).round().clamp(0.0, 7.0);
                normalized as u8
            })
            .collect()
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
