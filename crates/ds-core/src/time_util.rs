//! Microsecond timestamps and interval conversions.
//!
//! Sample timestamps are **microseconds since Unix epoch**; latencies and
//! intervals are `f64` seconds.

use std::time::{SystemTime, UNIX_EPOCH};

/// Microseconds per second.
pub const US_PER_SEC: f64 = 1_000_000.0;

/// Current time as **microseconds** since Unix epoch.
#[inline]
pub fn now_us() -> u64 {
    let d = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    d.as_secs() * 1_000_000 + u64::from(d.subsec_micros())
}

/// Seconds elapsed from `earlier_us` to `later_us`. Saturates at zero.
#[inline]
pub fn secs_between(earlier_us: u64, later_us: u64) -> f64 {
    later_us.saturating_sub(earlier_us) as f64 / US_PER_SEC
}

/// Convert a non-negative seconds value to whole microseconds.
#[inline]
pub fn secs_to_us(secs: f64) -> u64 {
    (secs.max(0.0) * US_PER_SEC).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(secs_to_us(1.5), 1_500_000);
        assert_eq!(secs_to_us(-2.0), 0);
        assert!((secs_between(1_000_000, 3_500_000) - 2.5).abs() < 1e-12);
        assert_eq!(secs_between(5, 1), 0.0);
    }

    #[test]
    fn now_is_after_2020() {
        assert!(now_us() > 1_577_836_800_000_000);
    }
}
