//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Limit a value to the inclusive range `[min, max]`.
///
/// NaN is passed through unchanged.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: Float
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

/// Round a value to the given number of decimal places.
pub fn round_dp<T>(value: T, places: i32) -> T
where
    T: Float
{
    let scale = T::from(10).unwrap_or_else(T::one).powi(places);

    (value * scale).round() / scale
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 100f64), (205f64, 410f64), 0f64), 205f64);
        assert_eq!(lin_map((0f64, 100f64), (205f64, 410f64), 100f64), 410f64);
        assert_eq!(lin_map((-100f64, 100f64), (205f64, 410f64), 0f64), 307.5f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&-3f64, &0f64, &1f64), 0f64);
        assert_eq!(clamp(&3f64, &0f64, &1f64), 1f64);
        assert_eq!(clamp(&0.5f64, &0f64, &1f64), 0.5f64);
        assert!(clamp(&std::f64::NAN, &0f64, &1f64).is_nan());
    }

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(7.456f64, 2), 7.46f64);
        assert_eq!(round_dp(7.454f64, 2), 7.45f64);
        assert_eq!(round_dp(0f64, 2), 0f64);
    }
}
