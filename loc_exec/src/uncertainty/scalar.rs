//! One-dimensional uncertain quantity

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Sub};

use util::maths::lerp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Variances below this are treated as exact.
pub const CRISP_VARIANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scalar with a mean and a variance. A variance of zero means the value is
/// known exactly.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UncertainScalar {
    pub mean: f64,

    /// Always non-negative.
    pub variance: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl UncertainScalar {
    pub fn from_variance(mean: f64, variance: f64) -> Self {
        Self { mean, variance }
    }

    pub fn from_std_dev(mean: f64, std_dev: f64) -> Self {
        Self { mean, variance: std_dev * std_dev }
    }

    /// An exactly known value.
    pub fn crisp(mean: f64) -> Self {
        Self { mean, variance: 0.0 }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    pub fn is_crisp(&self) -> bool {
        self.variance < CRISP_VARIANCE
    }

    /// Interpolate mean and variance independently. `t` is not clamped.
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        Self {
            mean: lerp(self.mean, end.mean, t),
            variance: lerp(self.variance, end.variance, t),
        }
    }

    /// Scale by a constant, the variance scaling by its square.
    pub fn times(&self, k: f64) -> Self {
        Self {
            mean: self.mean * k,
            variance: self.variance * k * k,
        }
    }
}

/// Sum of independent variables.
impl Add for UncertainScalar {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            mean: self.mean + rhs.mean,
            variance: self.variance + rhs.variance,
        }
    }
}

/// Difference of independent variables, the variances still add.
impl Sub for UncertainScalar {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            mean: self.mean - rhs.mean,
            variance: self.variance + rhs.variance,
        }
    }
}

impl Mul<f64> for UncertainScalar {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        self.times(rhs)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constructors() {
        let a = UncertainScalar::from_std_dev(1.0, 0.1);
        assert_relative_eq!(a.variance, 0.01, epsilon = 1e-15);
        assert_relative_eq!(a.std_dev(), 0.1, epsilon = 1e-15);
        assert!(!a.is_crisp());
        assert!(UncertainScalar::crisp(3.0).is_crisp());
        assert!(UncertainScalar::from_variance(0.0, 1e-10).is_crisp());
    }

    #[test]
    fn test_arithmetic() {
        let a = UncertainScalar::from_variance(1.0, 0.5);
        let b = UncertainScalar::from_variance(2.0, 0.25);

        assert_eq!(a + b, UncertainScalar::from_variance(3.0, 0.75));
        assert_eq!(a - b, UncertainScalar::from_variance(-1.0, 0.75));
        assert_eq!(a * 2.0, UncertainScalar::from_variance(2.0, 2.0));
    }

    #[test]
    fn test_interpolate() {
        let a = UncertainScalar::from_variance(0.0, 1.0);
        let b = UncertainScalar::from_variance(10.0, 3.0);

        assert_eq!(a.interpolate(&b, 0.0), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
        assert_eq!(
            a.interpolate(&b, 0.5),
            UncertainScalar::from_variance(5.0, 2.0)
        );
    }
}
