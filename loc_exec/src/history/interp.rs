//! Interpolation between history entries

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use util::maths::{get_ang_dist, wrap_pi};

use crate::{kinematics::SwerveKinematics, state::SwerveState};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Produces states between two recorded samples.
///
/// Rather than interpolating the pose directly, the wheel positions are
/// interpolated and driven through the kinematics from the start pose, so the
/// intermediate pose lies on the path the wheels actually describe.
#[derive(Debug, Clone)]
pub struct SwerveStateInterpolator {
    kinematics: SwerveKinematics,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveStateInterpolator {
    pub fn new(kinematics: SwerveKinematics) -> Self {
        Self { kinematics }
    }

    /// The state a fraction `t` of the way from `start` to `end`. The ends
    /// are returned exactly at `t <= 0` and `t >= 1`.
    pub fn interpolate(&self, start: &SwerveState, end: &SwerveState, t: f64) -> SwerveState {
        if t <= 0.0 {
            return *start;
        }
        if t >= 1.0 {
            return *end;
        }

        let wheel_positions = start.wheel_positions.interpolate(&end.wheel_positions, t);
        let twist = self
            .kinematics
            .to_twist(&start.wheel_positions.delta_to(&wheel_positions));

        SwerveState {
            pose: start.pose.exp(&twist),
            velocity: start.velocity.interpolate(&end.velocity, t),
            noise: start.noise.interpolate(&end.noise, t),
            wheel_positions,
            // Shortest arc, the gyro yaw is wrapped
            gyro_yaw_rad: wrap_pi(
                start.gyro_yaw_rad + t * get_ang_dist(start.gyro_yaw_rad, end.gyro_yaw_rad),
            ),
            gyro_bias: start.gyro_bias.interpolate(&end.gyro_bias, t),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geom::{Pose2, Velocity2},
        kinematics::{WheelPosition, WheelPositions},
        uncertainty::{PlanarNoise, UncertainScalar},
    };
    use approx::assert_abs_diff_eq;

    fn interp() -> SwerveStateInterpolator {
        SwerveStateInterpolator::new(SwerveKinematics::square(0.5).unwrap())
    }

    fn moved(distance_m: f64, x_m: f64) -> SwerveState {
        SwerveState {
            pose: Pose2::new(x_m, 0.0, 0.0),
            velocity: Velocity2 { vx_ms: 5.0, vy_ms: 0.0, omega_rads: 0.0 },
            noise: PlanarNoise::from_variance(0.02, 0.02),
            wheel_positions: WheelPositions(
                [WheelPosition::new(distance_m, Some(0.0)); 4]
            ),
            gyro_yaw_rad: 0.2,
            gyro_bias: UncertainScalar::from_variance(0.1, 0.2),
        }
    }

    #[test]
    fn test_ends_exact() {
        let start = SwerveState {
            wheel_positions: WheelPositions::zero(),
            ..Default::default()
        };
        let end = moved(0.1, 0.1);

        assert_eq!(interp().interpolate(&start, &end, 0.0), start);
        assert_eq!(interp().interpolate(&start, &end, -1.0), start);
        assert_eq!(interp().interpolate(&start, &end, 1.0), end);
        assert_eq!(interp().interpolate(&start, &end, 2.0), end);
    }

    #[test]
    fn test_midpoint() {
        let start = SwerveState {
            wheel_positions: WheelPositions::zero(),
            ..Default::default()
        };
        let end = moved(0.1, 0.1);

        let mid = interp().interpolate(&start, &end, 0.5);
        assert_abs_diff_eq!(mid.pose.x_m(), 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.pose.y_m(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.velocity.vx_ms, 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.noise.cartesian_variance, 0.01, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.gyro_yaw_rad, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.gyro_bias.mean, 0.05, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.gyro_bias.variance, 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.wheel_positions.0[2].distance_m, 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_follows_wheels_not_pose() {
        // The end pose disagrees with the wheels (as after a vision
        // correction); the interpolated pose follows the wheels from start
        let start = SwerveState {
            wheel_positions: WheelPositions::zero(),
            ..Default::default()
        };
        let end = moved(0.1, 1.0);

        let mid = interp().interpolate(&start, &end, 0.5);
        assert_abs_diff_eq!(mid.pose.x_m(), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_gyro_yaw_across_seam() {
        let start = SwerveState {
            wheel_positions: WheelPositions::zero(),
            gyro_yaw_rad: 3.1,
            ..Default::default()
        };
        let end = SwerveState {
            gyro_yaw_rad: -3.1,
            ..moved(0.1, 0.1)
        };

        // Halfway along the short arc is the seam itself, not zero
        let mid = interp().interpolate(&start, &end, 0.5);
        assert_abs_diff_eq!(mid.gyro_yaw_rad.abs(), std::f64::consts::PI, epsilon = 1e-9);

        let quarter = interp().interpolate(&start, &end, 0.25);
        let step_rad = 2.0 * std::f64::consts::PI - 6.2;
        assert_abs_diff_eq!(quarter.gyro_yaw_rad, 3.1 + 0.25 * step_rad, epsilon = 1e-9);

        let three_quarter = interp().interpolate(&start, &end, 0.75);
        assert_abs_diff_eq!(
            three_quarter.gyro_yaw_rad,
            -3.1 - 0.25 * step_rad,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_unknown_angles() {
        let start = SwerveState {
            wheel_positions: WheelPositions([WheelPosition::new(0.0, None); 4]),
            ..Default::default()
        };
        let end = SwerveState {
            wheel_positions: WheelPositions([WheelPosition::new(0.1, None); 4]),
            ..Default::default()
        };

        let mid = interp().interpolate(&start, &end, 0.5);
        assert_eq!(mid.wheel_positions.0[0], WheelPosition::new(0.05, None));
        assert_eq!(mid.pose, Pose2::default());
    }
}
