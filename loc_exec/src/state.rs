//! # Swerve state
//!
//! One sample of the estimator: the robot's pose and velocity with their
//! noise, plus the raw sensor readings it was derived from so that later
//! samples can be re-derived after a correction.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use crate::{
    geom::{Pose2, Velocity2},
    kinematics::WheelPositions,
    uncertainty::{NoisyPose, PlanarNoise, UncertainScalar},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Estimated state at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SwerveState {
    /// Pose of the robot in the field frame.
    pub pose: Pose2,

    /// Field-relative velocity.
    pub velocity: Velocity2,

    /// Noise of `pose`.
    pub noise: PlanarNoise,

    /// Wheel encoder readings at this instant.
    pub wheel_positions: WheelPositions,

    /// Raw gyro yaw reading at this instant.
    ///
    /// Units: radians
    pub gyro_yaw_rad: f64,

    /// Estimated gyro drift rate.
    ///
    /// Units: radians/second
    pub gyro_bias: UncertainScalar,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveState {
    pub fn noisy_pose(&self) -> NoisyPose {
        NoisyPose::new(self.pose, self.noise)
    }

    /// The same state with a corrected pose and noise. Sensor readings,
    /// velocity and gyro bias are kept.
    pub fn with_noisy_pose(&self, noisy_pose: &NoisyPose) -> Self {
        Self {
            pose: noisy_pose.pose,
            noise: noisy_pose.noise,
            ..*self
        }
    }
}
