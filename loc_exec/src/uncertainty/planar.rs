//! Isotropic planar noise and noisy poses

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::ops::Add;

use util::maths::lerp;

use crate::geom::Pose2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Noise in SE(2) with a single variance shared by x and y, and no covariance
/// between position and heading.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlanarNoise {
    /// Units: meters^2
    pub cartesian_variance: f64,

    /// Units: radians^2
    pub rotation_variance: f64,
}

/// A pose with its noise, for example a vision measurement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NoisyPose {
    pub pose: Pose2,
    pub noise: PlanarNoise,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanarNoise {
    pub fn from_std_dev(cartesian_std_dev_m: f64, rotation_std_dev_rad: f64) -> Self {
        Self {
            cartesian_variance: cartesian_std_dev_m * cartesian_std_dev_m,
            rotation_variance: rotation_std_dev_rad * rotation_std_dev_rad,
        }
    }

    pub fn from_variance(cartesian_variance: f64, rotation_variance: f64) -> Self {
        Self {
            cartesian_variance,
            rotation_variance,
        }
    }

    /// Noise so large that anything fused with it wins. Used when the pose is
    /// unknown.
    pub fn high() -> Self {
        Self::from_std_dev(10.0, 6.0)
    }

    pub fn cartesian_std_dev_m(&self) -> f64 {
        self.cartesian_variance.sqrt()
    }

    pub fn rotation_std_dev_rad(&self) -> f64 {
        self.rotation_variance.sqrt()
    }

    /// Component-wise interpolation, `t` is not clamped.
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        Self {
            cartesian_variance: lerp(self.cartesian_variance, end.cartesian_variance, t),
            rotation_variance: lerp(self.rotation_variance, end.rotation_variance, t),
        }
    }
}

/// Combination of independent noise sources.
impl Add for PlanarNoise {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            cartesian_variance: self.cartesian_variance + rhs.cartesian_variance,
            rotation_variance: self.rotation_variance + rhs.rotation_variance,
        }
    }
}

impl NoisyPose {
    pub fn new(pose: Pose2, noise: PlanarNoise) -> Self {
        Self { pose, noise }
    }
}
