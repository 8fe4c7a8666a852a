//! Duration strings used by the configuration ("30s", "500ms") and the
//! countdown shown while a cycle runs.

use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Suffix to nanoseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ns", 1.0),
    ("µs", 1_000.0),
    ("us", 1_000.0),
    ("ms", 1_000_000.0),
    ("s", 1_000_000_000.0),
];

/// Parse duration strings like "30s", "500ms", "1.5s".
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str
                .trim()
                .parse()
                .with_context(|| format!("Invalid duration value: {}", s))?;
            if !val.is_finite() || val < 0.0 {
                bail!("Duration must be a non-negative number: {}", s);
            }
            return Ok(Duration::from_nanos((val * multiplier) as u64));
        }
    }

    bail!("Unknown duration format: {}", s)
}

/// Format a duration for display with one decimal of seconds ("12.3s").
pub fn format_seconds(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}

/// Time left in a cycle of length `total` after `elapsed`.
pub fn remaining(total: Duration, elapsed: Duration) -> Duration {
    total.saturating_sub(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        let d = parse_duration("1.5s").unwrap();
        assert_eq!(d.as_millis(), 1500);
    }

    #[test]
    fn test_parse_milliseconds() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration(" 100ms ").unwrap(), Duration::from_millis(100));
    }

    #[test]
    fn test_parse_micro_and_nanoseconds() {
        assert_eq!(parse_duration("250us").unwrap().as_nanos(), 250_000);
        assert_eq!(parse_duration("16µs").unwrap().as_nanos(), 16_000);
        assert_eq!(parse_duration("0ns").unwrap().as_nanos(), 0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("thirty").is_err());
        assert!(parse_duration("-1s").is_err());
        assert!(parse_duration("10m").is_err());
    }

    #[test]
    fn test_remaining_and_format() {
        let total = Duration::from_secs(30);
        assert_eq!(remaining(total, Duration::from_secs(40)), Duration::ZERO);
        assert_eq!(format_seconds(remaining(total, Duration::from_millis(17_700))), "12.3s");
    }
}
