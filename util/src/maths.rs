//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::{Float, FloatConst};

/// Linearly interpolate between `start` and `end`, `t = 0` giving `start`.
pub fn lerp<T>(start: T, end: T, t: T) -> T
where
    T: Float
{
    start + (end - start) * t
}

/// Wrap an angle into the range `[-pi, pi)`.
pub fn wrap_pi<T>(angle: T) -> T
where
    T: Float + FloatConst
{
    rem_euclid(angle + T::PI(), T::PI() + T::PI()) - T::PI()
}

/// Get the signed shortest angular distance from `a` to `b`, in `[-pi, pi)`.
pub fn get_ang_dist<T>(a: T, b: T) -> T
where
    T: Float + FloatConst
{
    wrap_pi(b - a)
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
/// 
/// This function is taken from the std library as num is missing it.
///
/// In particular, the return value `r` satisfies `0.0 <= r < rhs.abs()` in
/// most cases. However, due to a floating point round-off error it can
/// result in `r == rhs.abs()`, violating the mathematical definition, if
/// `self` is much smaller than `rhs.abs()` in magnitude and `self < 0.0`.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;

    const PI: f64 = std::f64::consts::PI;
    const TAU: f64 = std::f64::consts::TAU;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(1f64, 3f64, 0.0), 1.0);
        assert_eq!(lerp(1f64, 3f64, 0.5), 2.0);
        assert_eq!(lerp(1f64, 3f64, 1.0), 3.0);
    }

    #[test]
    fn test_wrap_pi() {
        assert_abs_diff_eq!(wrap_pi(0f64), 0.0);
        assert_abs_diff_eq!(wrap_pi(TAU + 1.0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_pi(-TAU - 1.0), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_pi(PI + 0.5), -PI + 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_pi(-6f64), TAU - 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_get_ang_dist() {
        assert_abs_diff_eq!(get_ang_dist(1f64, 2f64), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(get_ang_dist(2f64, 1f64), -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(get_ang_dist(0f64, TAU), 0.0, epsilon = 1e-12);
        // Crossing the discontinuity goes the short way round
        assert_abs_diff_eq!(
            get_ang_dist(3f64, -3f64), TAU - 6.0, epsilon = 1e-12
        );
    }
}
