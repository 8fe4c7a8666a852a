//! Static reference data: shock absorber profiles, their sensor channels,
//! manufacturer standards and the simulator's severity bands.
//!
//! Nothing in here is mutated at runtime.

use serde::Serialize;

/// One sensor measurement stream and its nominal bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorChannel {
    pub id: &'static str,
    pub name: &'static str,
    pub unit: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
    pub min: f64,
    pub max: f64,
}

/// A shock absorber type with its named tests and sensor channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShockAbsorberProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub tests: &'static [&'static str],
    pub channels: &'static [SensorChannel],
}

impl ShockAbsorberProfile {
    /// Look up a channel definition by id.
    pub fn channel(&self, id: &str) -> Option<&'static SensorChannel> {
        self.channels.iter().find(|c| c.id == id)
    }
}

/// Manufacturer standard notes printed on reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ManufacturerStandard {
    pub id: &'static str,
    pub name: &'static str,
    pub norm: &'static str,
    pub gas_pressure: &'static str,
    pub fatigue_cycles: &'static str,
}

const VIBRATION: SensorChannel = SensorChannel {
    id: "vibracion",
    name: "Vibration",
    unit: "Hz",
    color: "#1E88E5",
    icon: "📳",
    min: 0.0,
    max: 100.0,
};

const PRESSURE: SensorChannel = SensorChannel {
    id: "presion",
    name: "Pressure",
    unit: "kPa",
    color: "#1565C0",
    icon: "💨",
    min: 0.0,
    max: 100.0,
};

const TEMPERATURE: SensorChannel = SensorChannel {
    id: "temperatura",
    name: "Temperature",
    unit: "°C",
    color: "#0D47A1",
    icon: "🌡️",
    min: 0.0,
    max: 150.0,
};

const FORCE: SensorChannel = SensorChannel {
    id: "fuerza",
    name: "Force",
    unit: "N",
    color: "#1976D2",
    icon: "⚡",
    min: 0.0,
    max: 1000.0,
};

const GAS_PRESSURE: SensorChannel = SensorChannel {
    id: "presion_gas",
    name: "Gas Pressure",
    unit: "bar",
    color: "#FF5722",
    icon: "⛽",
    min: 0.0,
    max: 40.0,
};

const RESISTANCE: SensorChannel = SensorChannel {
    id: "resistencia",
    name: "Resistance",
    unit: "Ω",
    color: "#9C27B0",
    icon: "🔌",
    min: 0.0,
    max: 20.0,
};

/// All known shock absorber profiles.
pub static PROFILES: &[ShockAbsorberProfile] = &[
    ShockAbsorberProfile {
        id: "hidraulico",
        name: "Hydraulic Shock Absorber",
        description: "Uses oil to absorb energy through internal valves",
        tests: &[
            "Force vs. Velocity Test (SAE J2788)",
            "Cavitation Test (ASTM D4172)",
            "Oil Leak Test",
        ],
        channels: &[VIBRATION, PRESSURE, TEMPERATURE, FORCE],
    },
    ShockAbsorberProfile {
        id: "gas_monotubo",
        name: "Gas Shock Absorber (Monotube)",
        description: "Uses oil and high-pressure nitrogen gas for a faster response",
        tests: &[
            "Gas Pressure Measurement (20-30 bar)",
            "Fast Response Test (ISO 18137)",
            "Durability Test (500,000 cycles)",
        ],
        channels: &[VIBRATION, PRESSURE, TEMPERATURE, FORCE, GAS_PRESSURE],
    },
    ShockAbsorberProfile {
        id: "gas_dobletubo",
        name: "Gas Shock Absorber (Twin Tube)",
        description: "Combines oil with low-pressure nitrogen gas",
        tests: &[
            "Water Tightness Test",
            "Impact Test (Salt Test)",
            "Dynamic Force Test",
        ],
        channels: &[VIBRATION, PRESSURE, TEMPERATURE, FORCE],
    },
    ShockAbsorberProfile {
        id: "regulable",
        name: "Adjustable Shock Absorber",
        description: "Allows adjusting the stiffness (Sport/Comfort modes)",
        tests: &[
            "Electrical Resistance Test (2-10 Ω)",
            "PWM Signal Response Test",
            "CAN Bus Compatibility Test",
        ],
        channels: &[VIBRATION, PRESSURE, TEMPERATURE, FORCE, RESISTANCE],
    },
];

/// All known manufacturers.
pub static MANUFACTURERS: &[ManufacturerStandard] = &[
    ManufacturerStandard {
        id: "bilstein",
        name: "Bilstein",
        norm: "B46-0001",
        gas_pressure: "25-30 bar",
        fatigue_cycles: "500,000",
    },
    ManufacturerStandard {
        id: "kyb",
        name: "KYB",
        norm: "KES 07.202",
        gas_pressure: "N/A",
        fatigue_cycles: "200,000",
    },
    ManufacturerStandard {
        id: "monroe",
        name: "Monroe",
        norm: "M-CARE 3.0",
        gas_pressure: "N/A",
        fatigue_cycles: "200,000",
    },
    ManufacturerStandard {
        id: "ohlins",
        name: "Öhlins",
        norm: "TTX Series",
        gas_pressure: "20-25 bar",
        fatigue_cycles: "1,000,000+",
    },
    ManufacturerStandard {
        id: "sachs",
        name: "Sachs",
        norm: "SRE 4.2",
        gas_pressure: "N/A",
        fatigue_cycles: "300,000",
    },
];

/// Profile selected at startup.
pub const DEFAULT_PROFILE: &str = "gas_monotubo";
/// Manufacturer selected at startup.
pub const DEFAULT_MANUFACTURER: &str = "bilstein";

/// Number of simulator severity bands (optimal, critical, acceptable).
pub const SEVERITY_BANDS: usize = 3;

/// Find a profile by id.
pub fn profile(id: &str) -> Option<&'static ShockAbsorberProfile> {
    PROFILES.iter().find(|p| p.id == id)
}

/// Find a manufacturer by id.
pub fn manufacturer(id: &str) -> Option<&'static ManufacturerStandard> {
    MANUFACTURERS.iter().find(|m| m.id == id)
}

/// Closed target interval the simulator drifts within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRange {
    pub min: f64,
    pub max: f64,
}

impl TargetRange {
    const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Target range for `channel_id` in severity `band` for `profile`.
///
/// Returns `None` for an out-of-range band or a channel the simulator does
/// not drive. Gas pressure only has a non-zero band on the monotube profile.
pub fn target_range(
    band: usize,
    profile: &ShockAbsorberProfile,
    channel_id: &str,
) -> Option<TargetRange> {
    let monotube = profile.id == "gas_monotubo";
    let gas = |min: f64, max: f64| {
        if monotube {
            TargetRange::new(min, max)
        } else {
            TargetRange::new(0.0, 0.0)
        }
    };

    let range = match (band, channel_id) {
        // Optimal
        (0, "vibracion") => TargetRange::new(5.0, 15.0),
        (0, "presion") => TargetRange::new(30.0, 50.0),
        (0, "temperatura") => TargetRange::new(25.0, 40.0),
        (0, "fuerza") => TargetRange::new(700.0, 900.0),
        (0, "presion_gas") => gas(25.0, 30.0),
        (0, "resistencia") => TargetRange::new(2.0, 10.0),
        // Critical
        (1, "vibracion") => TargetRange::new(40.0, 60.0),
        (1, "presion") => TargetRange::new(5.0, 20.0),
        (1, "temperatura") => TargetRange::new(60.0, 80.0),
        (1, "fuerza") => TargetRange::new(200.0, 400.0),
        (1, "presion_gas") => gas(10.0, 15.0),
        (1, "resistencia") => TargetRange::new(0.0, 1.0),
        // Acceptable
        (2, "vibracion") => TargetRange::new(20.0, 35.0),
        (2, "presion") => TargetRange::new(20.0, 40.0),
        (2, "temperatura") => TargetRange::new(40.0, 55.0),
        (2, "fuerza") => TargetRange::new(500.0, 700.0),
        (2, "presion_gas") => gas(20.0, 25.0),
        (2, "resistencia") => TargetRange::new(1.0, 2.0),
        _ => return None,
    };
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_exist() {
        assert!(profile(DEFAULT_PROFILE).is_some());
        assert!(manufacturer(DEFAULT_MANUFACTURER).is_some());
        assert!(profile("unknown").is_none());
    }

    #[test]
    fn test_channel_bounds_are_ordered() {
        for p in PROFILES {
            assert_eq!(p.tests.len(), 3, "{}", p.id);
            for c in p.channels {
                assert!(c.min < c.max, "{}:{}", p.id, c.id);
            }
        }
    }

    #[test]
    fn test_every_channel_has_a_band() {
        for p in PROFILES {
            for band in 0..SEVERITY_BANDS {
                for c in p.channels {
                    let range = target_range(band, p, c.id).unwrap();
                    assert!(range.min <= range.max);
                    assert!(range.min >= c.min && range.max <= c.max);
                }
            }
        }
        assert!(target_range(SEVERITY_BANDS, &PROFILES[0], "vibracion").is_none());
    }

    #[test]
    fn test_gas_band_only_on_monotube() {
        let mono = profile("gas_monotubo").unwrap();
        let twin = profile("gas_dobletubo").unwrap();
        assert_eq!(
            target_range(0, mono, "presion_gas"),
            Some(TargetRange { min: 25.0, max: 30.0 })
        );
        assert_eq!(target_range(0, twin, "presion_gas").unwrap().width(), 0.0);
    }

    #[test]
    fn test_channel_lookup() {
        let p = profile("regulable").unwrap();
        assert_eq!(p.channel("resistencia").unwrap().unit, "Ω");
        assert!(p.channel("presion_gas").is_none());
    }
}
