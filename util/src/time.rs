//! General time utility functions

use chrono;

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Convert a duration into a number of seconds, or `None` if the nanosecond
/// count overflows.
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

/// Get the period of a loop running at the given rate in Hz.
pub fn period_for_rate_hz(rate_hz: f64) -> std::time::Duration {
    std::time::Duration::from_secs_f64(1.0 / rate_hz)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
        assert_eq!(duration_to_seconds(chrono::Duration::max_value()), None);
    }

    #[test]
    fn test_period_for_rate() {
        assert_eq!(period_for_rate_hz(20.0), std::time::Duration::from_millis(50));
    }
}
