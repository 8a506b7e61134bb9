//! Sensor interfaces consumed by localisation.

use crate::kinematics::WheelPositions;

/// Wheel encoders of all swerve modules.
pub trait WheelEncoders {
    /// Current accumulated positions, ordered front-left, front-right,
    /// rear-left, rear-right.
    fn wheel_positions(&self) -> WheelPositions;
}

/// A yaw gyro, counter-clockwise positive.
pub trait Gyro {
    /// Units: radians
    fn yaw_rad(&self) -> f64;

    /// Units: radians/second
    fn yaw_rate_rads(&self) -> f64;

    /// White noise standard deviation of the rate measurement. Multiply by
    /// the sample period for the noise of a yaw delta.
    ///
    /// Units: radians/second
    fn white_noise_rads(&self) -> f64;

    /// Standard deviation of the bias (drift) rate, the "bias stability".
    ///
    /// Units: radians/second
    fn bias_noise_rads(&self) -> f64;
}
