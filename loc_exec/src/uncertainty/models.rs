//! Empirical noise models.
//!
//! Vision error comes from the tag-detection accuracy curves in Wang & Olson,
//! "AprilTag 2" (IROS 2016): figure 5 for range and figure 6 for the off-axis
//! angle. Odometry error is superlinear in the distance travelled per sample.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use super::{PlanarNoise, UncertaintyError};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this off-axis angle the tag bearing is unusable.
///
/// Units: degrees
const MIN_OFF_AXIS_DEG: f64 = 3.0;

/// Added to both vision error terms.
const VISION_ERROR_FLOOR: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Coefficients of the odometry error polynomial `a·|x| + b·x²`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OdometryNoiseModel {
    /// Linear term, the error measured at low speed.
    pub low_speed_error: f64,

    /// Quadratic term.
    pub super_error: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for OdometryNoiseModel {
    fn default() -> Self {
        Self {
            low_speed_error: 0.05,
            super_error: 0.5,
        }
    }
}

impl OdometryNoiseModel {
    fn poly(&self, norm: f64) -> f64 {
        self.low_speed_error * norm + self.super_error * norm * norm
    }

    /// Cartesian standard deviation for one sample's travel.
    ///
    /// Units: meters
    pub fn cartesian_std_dev(&self, distance_m: f64) -> f64 {
        self.poly(distance_m.abs())
    }

    /// Rotation standard deviation for one sample, treating one meter of
    /// travel as one radian of rotation.
    ///
    /// Units: radians
    pub fn rotation_std_dev(&self, distance_m: f64, rotation_rad: f64) -> f64 {
        self.poly(distance_m.abs() + rotation_rad.abs())
    }

    /// The noise one odometry sample adds to the estimate.
    pub fn sample_noise(&self, distance_m: f64, rotation_rad: f64) -> PlanarNoise {
        PlanarNoise::from_std_dev(
            self.cartesian_std_dev(distance_m),
            self.rotation_std_dev(distance_m, rotation_rad),
        )
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Odometry cartesian standard deviation with the default coefficients.
pub fn odometry_cartesian_std_dev(distance_m: f64) -> f64 {
    OdometryNoiseModel::default().cartesian_std_dev(distance_m)
}

/// Odometry rotation standard deviation with the default coefficients.
pub fn odometry_rotation_std_dev(distance_m: f64, rotation_rad: f64) -> f64 {
    OdometryNoiseModel::default().rotation_std_dev(distance_m, rotation_rad)
}

/// Noise of a vision pose measurement from a tag at `distance_m`, seen at
/// `off_axis_rad` from the tag normal.
///
/// The large bearing error makes the position uncertainty crescent shaped, so
/// the cartesian error is the larger of the range error and the arc the
/// bearing error sweeps at this distance. Looking straight down the tag axis
/// the bearing is unusable and the rotation error is effectively infinite.
pub fn vision_measurement_noise(
    distance_m: f64,
    off_axis_rad: f64
) -> Result<PlanarNoise, UncertaintyError> {
    if distance_m < 0.0 {
        return Err(UncertaintyError::NegativeDistance(distance_m));
    }
    if off_axis_rad < 0.0 {
        return Err(UncertaintyError::NegativeOffAxisAngle(off_axis_rad));
    }

    let cartesian_error_m = range_error_m(distance_m) + VISION_ERROR_FLOOR;
    let rotation_error_rad = bearing_error_rad(off_axis_rad) + VISION_ERROR_FLOOR;
    let rotation_effect_m = distance_m * rotation_error_rad;

    Ok(PlanarNoise::from_std_dev(
        cartesian_error_m.max(rotation_effect_m),
        rotation_error_rad,
    ))
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Linear in range (figure 5).
fn range_error_m(distance_m: f64) -> f64 {
    0.03 * distance_m
}

/// U-shaped in the off-axis angle (figure 6), which is plotted in degrees.
fn bearing_error_rad(off_axis_rad: f64) -> f64 {
    let off_axis_deg = off_axis_rad.to_degrees();
    if off_axis_deg < MIN_OFF_AXIS_DEG {
        return f64::MAX;
    }
    let error_deg = 10.0 / off_axis_deg + 10.0 / (85.0 - off_axis_deg).powf(1.2);
    error_deg.to_radians()
}
