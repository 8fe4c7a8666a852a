//! Rolling aggregation across all channels of a profile.

use std::collections::BTreeMap;

use super::reading::{ReadingSummary, SensorReading};
use crate::catalog::SensorChannel;

/// Raw readings keyed by channel id, as decoded from a device payload.
pub type RawReadings = BTreeMap<String, f64>;

/// Per-channel rolling state for the active profile.
///
/// Channels are kept in profile order. Values for unknown channels are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorAggregator {
    channels: Vec<(&'static str, SensorReading)>,
}

impl SensorAggregator {
    /// Create an aggregator with every channel at zero.
    pub fn new(channels: &[SensorChannel]) -> Self {
        let mut aggregator = Self::default();
        aggregator.reset(channels);
        aggregator
    }

    /// Reinitialize every channel to zero/empty state.
    pub fn reset(&mut self, channels: &[SensorChannel]) {
        self.channels = channels.iter().map(|c| (c.id, SensorReading::new())).collect();
    }

    /// Feed one raw value to a channel.
    ///
    /// Returns `false` if the channel is unknown or the value not finite.
    pub fn ingest(&mut self, channel_id: &str, value: f64) -> bool {
        match self.get_mut(channel_id) {
            Some(reading) => reading.record(value),
            None => false,
        }
    }

    /// Feed every present field of a decoded payload.
    ///
    /// Returns the number of values recorded.
    pub fn ingest_all(&mut self, readings: &RawReadings) -> usize {
        readings.iter().filter(|(id, value)| self.ingest(id, **value)).count()
    }

    /// Restart a channel at `value` with an empty history.
    pub fn seed(&mut self, channel_id: &str, value: f64) {
        if let Some(reading) = self.get_mut(channel_id) {
            reading.seed(value);
        }
    }

    pub fn get(&self, channel_id: &str) -> Option<&SensorReading> {
        self.channels.iter().find(|(id, _)| *id == channel_id).map(|(_, r)| r)
    }

    fn get_mut(&mut self, channel_id: &str) -> Option<&mut SensorReading> {
        self.channels.iter_mut().find(|(id, _)| *id == channel_id).map(|(_, r)| r)
    }

    /// Channels in profile order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &SensorReading)> {
        self.channels.iter().map(|(id, r)| (*id, r))
    }

    /// Display figures for every channel, keyed by channel id.
    pub fn summaries(&self) -> BTreeMap<&'static str, ReadingSummary> {
        self.iter().map(|(id, r)| (id, r.summary())).collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;
    use crate::data::reading::HISTORY_CAPACITY;

    fn two_channels() -> Vec<SensorChannel> {
        let p = catalog::profile("hidraulico").unwrap();
        vec![*p.channel("vibracion").unwrap(), *p.channel("presion").unwrap()]
    }

    #[test]
    fn test_example_sequence() {
        let mut agg = SensorAggregator::new(&two_channels());
        for v in [10.0, 20.0, 30.0] {
            assert!(agg.ingest("vibracion", v));
        }

        let vib = agg.get("vibracion").unwrap();
        assert_eq!(vib.history().iter().copied().collect::<Vec<_>>(), vec![10.0, 20.0, 30.0]);
        assert_eq!(vib.min(), 10.0);
        assert_eq!(vib.max(), 30.0);
        assert_eq!(vib.summary().average, 20.0);

        // Untouched channel stays at zero
        let pres = agg.get("presion").unwrap();
        assert!(pres.history().is_empty());
        assert_eq!(pres.summary().current, 0.0);
    }

    #[test]
    fn test_unknown_channel_is_skipped() {
        let mut agg = SensorAggregator::new(&two_channels());
        let before = agg.clone();
        assert!(!agg.ingest("temperatura", 42.0));
        assert_eq!(agg, before);
    }

    #[test]
    fn test_reset_matches_fresh_aggregator() {
        let channels = two_channels();
        let sequence = [("vibracion", 4.0), ("presion", 55.5), ("vibracion", 7.25), ("presion", 1.0)];

        let mut reused = SensorAggregator::new(&channels);
        for i in 0..50 {
            reused.ingest("vibracion", i as f64);
        }
        reused.reset(&channels);
        for (id, v) in sequence {
            reused.ingest(id, v);
        }

        let mut fresh = SensorAggregator::new(&channels);
        for (id, v) in sequence {
            fresh.ingest(id, v);
        }

        assert_eq!(reused, fresh);
    }

    #[test]
    fn test_invariants_hold_after_many_ingests() {
        let mut agg = SensorAggregator::new(&two_channels());
        for i in 0..200 {
            let v = ((i * 37) % 101) as f64 - 20.0;
            agg.ingest("vibracion", v);
            agg.ingest("presion", -v);
        }
        for (_, reading) in agg.iter() {
            assert!(reading.history().len() <= HISTORY_CAPACITY);
            assert!(reading.history().iter().all(|&h| reading.min() <= h && h <= reading.max()));
        }
    }

    #[test]
    fn test_ingest_all_counts_recorded_values() {
        let mut agg = SensorAggregator::new(&two_channels());
        let mut readings = RawReadings::new();
        readings.insert("vibracion".to_string(), 12.0);
        readings.insert("presion".to_string(), 40.0);
        readings.insert("bogus".to_string(), 1.0);
        assert_eq!(agg.ingest_all(&readings), 2);
        assert_eq!(agg.summaries()["presion"].current, 40.0);
    }

    #[test]
    fn test_iteration_follows_profile_order() {
        let p = catalog::profile("gas_monotubo").unwrap();
        let agg = SensorAggregator::new(p.channels);
        let ids: Vec<_> = agg.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["vibracion", "presion", "temperatura", "fuerza", "presion_gas"]);
    }
}
