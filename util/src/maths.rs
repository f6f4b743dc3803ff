//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Limit the magnitude of a value to `limit`, preserving its sign.
///
/// `limit` must be non-negative.
pub fn clamp_abs<T>(value: T, limit: T) -> T
where
    T: Float,
{
    if value.abs() > limit {
        limit * value.signum()
    } else {
        value
    }
}

/// Relative error between a measured value and its target.
///
/// `target` must be non-zero.
pub fn rel_error<T>(value: T, target: T) -> T
where
    T: Float,
{
    (value - target).abs() / target
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_clamp_abs() {
        assert_eq!(clamp_abs(0.7f64, 0.6), 0.6);
        assert_eq!(clamp_abs(-0.9f64, 0.6), -0.6);
        assert_eq!(clamp_abs(0.3f64, 0.6), 0.3);
        assert_eq!(clamp_abs(-0.6f64, 0.6), -0.6);
    }

    #[test]
    fn test_rel_error() {
        assert!((rel_error(0.19f64, 0.2) - 0.05).abs() < 1e-9);
        assert_eq!(rel_error(0.2f64, 0.2), 0.0);
        assert_eq!(rel_error(0.0f64, 0.2), 1.0);
    }
}
