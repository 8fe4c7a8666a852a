//! Built-in sensor simulator.
//!
//! Produces readings that drift inside the target band of a randomly chosen
//! health state. The simulator owns no randomness of its own: every draw
//! goes through the RNG passed in, so a seeded RNG makes it deterministic.

use rand::Rng;

use crate::catalog::{self, ShockAbsorberProfile, TargetRange, SEVERITY_BANDS};

/// Fraction of the band width a single step may move (split evenly around zero).
const DRIFT_FRACTION: f64 = 0.1;

/// Synthetic reading generator for one profile.
#[derive(Debug, Clone)]
pub struct SimulatedSource {
    profile: &'static ShockAbsorberProfile,
    band: usize,
    /// (channel id, target range, previous value) for every driven channel.
    channels: Vec<(&'static str, TargetRange, f64)>,
}

impl SimulatedSource {
    /// Pick a severity band uniformly at random and build the simulator.
    pub fn activate<R: Rng + ?Sized>(profile: &'static ShockAbsorberProfile, rng: &mut R) -> Self {
        let band = rng.gen_range(0..SEVERITY_BANDS);
        Self::with_band(profile, band)
    }

    /// Build the simulator for a specific band.
    ///
    /// Every driven channel starts at the band's minimum.
    pub fn with_band(profile: &'static ShockAbsorberProfile, band: usize) -> Self {
        let channels = profile
            .channels
            .iter()
            .filter_map(|c| {
                catalog::target_range(band, profile, c.id).map(|range| (c.id, range, range.min))
            })
            .collect();

        Self {
            profile,
            band,
            channels,
        }
    }

    /// Severity band index (0 optimal, 1 critical, 2 acceptable).
    pub fn band(&self) -> usize {
        self.band
    }

    /// Initial value of every driven channel.
    pub fn seeds(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.channels.iter().map(|(id, range, _)| (*id, range.min))
    }

    /// Produce the next sample for every driven channel.
    ///
    /// Each value moves by a uniform draw from `±DRIFT_FRACTION * width / 2`
    /// and is clamped into the band.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<(&'static str, f64)> {
        self.channels
            .iter_mut()
            .map(|(id, range, previous)| {
                let half = DRIFT_FRACTION * range.width() / 2.0;
                let perturbation = if half > 0.0 { rng.gen_range(-half..=half) } else { 0.0 };
                let value = range.clamp(*previous + perturbation);
                *previous = value;
                (*id, value)
            })
            .collect()
    }

    /// Pick one of the profile's tests at random.
    pub fn pick_test<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&'static str> {
        if self.profile.tests.is_empty() {
            return None;
        }
        Some(self.profile.tests[rng.gen_range(0..self.profile.tests.len())])
    }
}

/// Append `test` unless it is already present, keeping first-seen order.
///
/// Returns whether the list changed.
pub fn record_test(performed: &mut Vec<&'static str>, test: &'static str) -> bool {
    if performed.contains(&test) {
        return false;
    }
    performed.push(test);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn monotube() -> &'static ShockAbsorberProfile {
        catalog::profile("gas_monotubo").unwrap()
    }

    #[test]
    fn test_seeds_start_at_band_minimum() {
        let sim = SimulatedSource::with_band(monotube(), 1);
        let seeds: Vec<_> = sim.seeds().collect();
        assert_eq!(seeds.len(), 5);
        assert!(seeds.contains(&("vibracion", 40.0)));
        assert!(seeds.contains(&("presion_gas", 10.0)));
    }

    #[test]
    fn test_steps_stay_in_band() {
        let mut rng = StdRng::seed_from_u64(42);
        let profile = monotube();
        for band in 0..SEVERITY_BANDS {
            let mut sim = SimulatedSource::with_band(profile, band);
            for _ in 0..500 {
                for (id, value) in sim.step(&mut rng) {
                    let range = catalog::target_range(band, profile, id).unwrap();
                    assert!(value >= range.min && value <= range.max, "{id}={value}");
                }
            }
        }
    }

    #[test]
    fn test_step_moves_at_most_half_drift() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sim = SimulatedSource::with_band(monotube(), 0);
        let mut previous: Vec<f64> = sim.seeds().map(|(_, v)| v).collect();
        for _ in 0..100 {
            let sample = sim.step(&mut rng);
            for ((id, value), prev) in sample.iter().zip(previous.iter()) {
                let range = catalog::target_range(0, monotube(), id).unwrap();
                assert!((value - prev).abs() <= DRIFT_FRACTION * range.width() / 2.0 + 1e-9);
            }
            previous = sample.into_iter().map(|(_, v)| v).collect();
        }
    }

    #[test]
    fn test_zero_width_band_is_constant() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut sim = SimulatedSource::with_band(monotube(), 0);
        sim.channels.push(("flat", TargetRange { min: 0.0, max: 0.0 }, 0.0));
        for _ in 0..10 {
            let sample = sim.step(&mut rng);
            assert_eq!(sample.last(), Some(&("flat", 0.0)));
        }
    }

    #[test]
    fn test_seeded_rng_is_deterministic() {
        let run = || {
            let mut rng = StdRng::seed_from_u64(1234);
            let mut sim = SimulatedSource::activate(monotube(), &mut rng);
            (0..20).map(|_| sim.step(&mut rng)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_record_test_is_set_like() {
        let mut rng = StdRng::seed_from_u64(5);
        let sim = SimulatedSource::with_band(monotube(), 2);
        let mut performed = Vec::new();
        for _ in 0..50 {
            if let Some(test) = sim.pick_test(&mut rng) {
                record_test(&mut performed, test);
            }
        }
        assert!(performed.len() <= monotube().tests.len());
        let unique: std::collections::HashSet<_> = performed.iter().collect();
        assert_eq!(unique.len(), performed.len());

        let mut list = vec!["a"];
        assert!(!record_test(&mut list, "a"));
        assert!(record_test(&mut list, "b"));
        assert_eq!(list, vec!["a", "b"]);
    }
}
