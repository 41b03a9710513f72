//! Mathematical primitives for 2D localization.
//!
//! Angle normalization and angular arithmetic used throughout the filter.

/// Normalize an angle to (-π, π].
///
/// Uses the `atan2(sin, cos)` form so the result is exact for any finite
/// input magnitude, matching the bearing renormalization done inside the
/// sensor model.
///
/// # Example
/// ```
/// use disha_loc::core::math::normalize_angle;
/// use std::f32::consts::PI;
///
/// assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-6);
/// assert!((normalize_angle(-0.5 * PI) + 0.5 * PI).abs() < 1e-6);
/// ```
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    angle.sin().atan2(angle.cos())
}

/// Shortest signed angular difference `a - b`, normalized to (-π, π].
///
/// This is the dead-reckoning delta convention: the rotation carried in an
/// odometry delta is `previous.theta - current.theta`.
#[inline]
pub fn angle_diff(a: f32, b: f32) -> f32 {
    normalize_angle(a - b)
}

/// Convert a bearing in radians to its one-degree sensor bucket in [0, 359].
///
/// Rounds half away from zero (`f32::round`), then wraps negative degrees
/// into the positive range, so a bearing of -90° lands in bucket 270.
#[inline]
pub fn bearing_to_bucket(bearing: f32) -> usize {
    let deg = normalize_angle(bearing).to_degrees().round() as i32;
    deg.rem_euclid(360) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_normalize_angle_zero() {
        assert_relative_eq!(normalize_angle(0.0), 0.0);
    }

    #[test]
    fn test_normalize_angle_wrap_positive() {
        assert_relative_eq!(normalize_angle(2.0 * PI), 0.0, epsilon = 1e-6);
        assert_relative_eq!(normalize_angle(3.0 * PI), PI, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_angle_wrap_negative() {
        assert_relative_eq!(normalize_angle(-2.0 * PI), 0.0, epsilon = 1e-6);
        // -π wraps to +π: the interval is half-open at -π.
        assert_relative_eq!(normalize_angle(-3.0 * PI), PI, epsilon = 1e-6);
    }

    #[test]
    fn test_normalize_angle_just_beyond_boundary() {
        let result = normalize_angle(PI + 0.001);
        assert!(result < 0.0, "should wrap to negative: {}", result);
        assert_relative_eq!(result, -PI + 0.001, epsilon = 1e-5);
    }

    #[test]
    fn test_angle_diff_simple() {
        assert_relative_eq!(angle_diff(PI / 2.0, 0.0), PI / 2.0);
        assert_relative_eq!(angle_diff(0.0, PI / 2.0), -PI / 2.0);
    }

    #[test]
    fn test_angle_diff_crossing_pi() {
        // Crossing the ±π boundary takes the short way.
        assert_relative_eq!(angle_diff(-PI + 0.1, PI - 0.1), 0.2, epsilon = 1e-6);
        assert_relative_eq!(angle_diff(PI - 0.1, -PI + 0.1), -0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_bearing_bucket_zero() {
        assert_eq!(bearing_to_bucket(0.0), 0);
    }

    #[test]
    fn test_bearing_bucket_rounds_half_away_from_zero() {
        // The convention is round half away from zero: a bearing at the
        // 0.5° midpoint lands in bucket 1, not bucket 0.
        assert_eq!(0.5_f32.round() as i32, 1);
        assert_eq!(bearing_to_bucket(0.501_f32.to_radians()), 1);
        assert_eq!(bearing_to_bucket(0.499_f32.to_radians()), 0);
    }

    #[test]
    fn test_bearing_bucket_negative_wraps() {
        assert_eq!(bearing_to_bucket(-90.0_f32.to_radians()), 270);
        assert_eq!(bearing_to_bucket(-1.0_f32.to_radians()), 359);
    }

    #[test]
    fn test_bearing_bucket_near_pi() {
        assert_eq!(bearing_to_bucket(PI), 180);
    }

    #[test]
    fn test_normalize_handles_nan() {
        assert!(normalize_angle(f32::NAN).is_nan());
    }
}
