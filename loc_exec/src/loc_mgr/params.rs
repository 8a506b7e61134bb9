//! Parameters structure for LocMgr

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::{fusion::Fusor, kinematics::NUM_MODULES, uncertainty::OdometryNoiseModel};
use super::LocMgrError;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for localisation.
#[derive(Debug, Clone, Deserialize)]
pub struct Params {

    // ---- HISTORY ----

    /// How far back vision measurements may be applied.
    ///
    /// Units: seconds
    pub history_horizon_s: f64,

    /// Nominal control cycle period, used to size the history.
    ///
    /// Units: seconds
    pub nominal_period_s: f64,

    // ---- GEOMETRY ----

    /// The position of the swerve modules, ordered front-left, front-right,
    /// rear-left, rear-right.
    ///
    /// Units: meters,
    /// Frame: Robot body
    pub module_pos_m_rb: [[f64; 2]; NUM_MODULES],

    // ---- NOISE ----

    /// Coefficients of the odometry noise model.
    pub odometry_noise: OdometryNoiseModel,

    /// Initial estimate of the gyro drift.
    ///
    /// Units: radians/second
    pub gyro_bias_rads: f64,

    /// Standard deviation of the initial gyro drift estimate.
    ///
    /// Units: radians/second
    pub gyro_bias_std_dev_rads: f64,

    // ---- VISION ----

    /// How vision measurements are fused into the history.
    #[serde(default)]
    pub vision_fusor: Fusor,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            history_horizon_s: 0.2,
            nominal_period_s: 0.02,
            module_pos_m_rb: [[0.25, 0.25], [0.25, -0.25], [-0.25, 0.25], [-0.25, -0.25]],
            odometry_noise: OdometryNoiseModel::default(),
            gyro_bias_rads: 0.0,
            gyro_bias_std_dev_rads: 0.0,
            vision_fusor: Fusor::default(),
        }
    }
}

impl Params {
    /// Check the values make sense together.
    pub fn validate(&self) -> Result<(), LocMgrError> {
        if !(self.history_horizon_s > 0.0) {
            return Err(LocMgrError::InvalidParams(format!(
                "history_horizon_s must be positive, got {}",
                self.history_horizon_s
            )));
        }
        if !(self.nominal_period_s > 0.0) {
            return Err(LocMgrError::InvalidParams(format!(
                "nominal_period_s must be positive, got {}",
                self.nominal_period_s
            )));
        }
        if self.gyro_bias_std_dev_rads < 0.0 {
            return Err(LocMgrError::InvalidParams(format!(
                "gyro_bias_std_dev_rads must not be negative, got {}",
                self.gyro_bias_std_dev_rads
            )));
        }
        Ok(())
    }
}
