//! Nudging a pose towards a measurement

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use crate::{
    fusion::Fusor,
    geom::Pose2,
    state::SwerveState,
    uncertainty::{NoisyPose, PlanarNoise, UncertainScalar},
};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Move `sample` towards `measurement` by the fused estimate of the
/// separation between them.
///
/// Position and heading are treated independently. For position the
/// separation is the straight-line distance, so the result always lies on the
/// segment between the two. For heading it is the shortest signed angle, so
/// corrections across the +/-pi seam go the short way round.
pub fn nudge_pose(sample: &NoisyPose, measurement: &NoisyPose, fusor: Fusor) -> NoisyPose {
    // ---- CARTESIAN ----

    let offset_m = measurement.pose.position_m - sample.pose.position_m;
    let distance_m = offset_m.norm();

    let cartesian = fusor.fuse(
        UncertainScalar::from_variance(0.0, sample.noise.cartesian_variance),
        UncertainScalar::from_variance(distance_m, measurement.noise.cartesian_variance),
    );

    let position_m = if distance_m > 0.0 {
        sample.pose.position_m + offset_m * (cartesian.mean / distance_m)
    }
    else {
        sample.pose.position_m
    };

    // ---- ROTATION ----

    let heading_error_rad = sample.pose.heading_error_rad(&measurement.pose);

    let rotation = fusor.fuse(
        UncertainScalar::from_variance(0.0, sample.noise.rotation_variance),
        UncertainScalar::from_variance(heading_error_rad, measurement.noise.rotation_variance),
    );

    NoisyPose::new(
        Pose2::new(
            position_m.x,
            position_m.y,
            sample.pose.heading_rad + rotation.mean,
        ),
        PlanarNoise::from_variance(cartesian.variance, rotation.variance),
    )
}

/// Apply a measurement to a history state, keeping its sensor readings,
/// velocity and gyro bias.
pub fn nudge(sample: &SwerveState, measurement: &NoisyPose, fusor: Fusor) -> SwerveState {
    sample.with_noisy_pose(&nudge_pose(&sample.noisy_pose(), measurement, fusor))
}

/// Apply a sequence of measurements in order.
pub fn nudge_all(sample: &SwerveState, measurements: &[NoisyPose], fusor: Fusor) -> SwerveState {
    measurements
        .iter()
        .fold(*sample, |s, m| nudge(&s, m, fusor))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{WheelPosition, WheelPositions};
    use crate::geom::Velocity2;
    use approx::assert_abs_diff_eq;

    const FUSOR: Fusor = Fusor::CovarianceInflation;

    fn noisy(x: f64, y: f64, heading: f64, noise: PlanarNoise) -> NoisyPose {
        NoisyPose::new(Pose2::new(x, y, heading), noise)
    }

    #[test]
    fn test_zero_nudge() {
        let sample = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.01, 0.01));
        let measurement = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.02, 0.02));

        let n = nudge_pose(&sample, &measurement, FUSOR);
        assert_eq!(n.pose, Pose2::default());
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.008944, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.008944, epsilon = 1e-6);
    }

    #[test]
    fn test_gentle_nudge() {
        let sample = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.001, 0.1));
        let measurement = noisy(0.1, 0.0, 1.0, PlanarNoise::from_std_dev(0.1, f64::MAX));

        let n = nudge_pose(&sample, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 0.000010, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.y_m(), 0.0, epsilon = 1e-6);
        // Heading measurement is worthless
        assert_abs_diff_eq!(n.pose.heading_rad, 0.0, epsilon = 1e-6);
        // Floored
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.003, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.1, epsilon = 1e-6);
    }

    #[test]
    fn test_firm_nudge() {
        let sample = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.01, 0.1));
        let measurement = noisy(0.1, 0.0, 0.0, PlanarNoise::from_std_dev(0.05, 0.5));

        let n = nudge_pose(&sample, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 0.003846, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.y_m(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.heading_rad, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.010176, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.098058, epsilon = 1e-6);
    }

    #[test]
    fn test_firm_nudge_all_axes() {
        let sample = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.01, 0.1));
        let measurement = noisy(1.0, 2.0, 3.0, PlanarNoise::from_std_dev(0.05, 0.5));

        let n = nudge_pose(&sample, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 0.038461, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.y_m(), 0.076923, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.heading_rad, 0.115385, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.061598, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.127562, epsilon = 1e-6);
    }

    #[test]
    fn test_angle_crossing() {
        let sample = noisy(0.0, 0.0, 3.0, PlanarNoise::from_std_dev(0.01, 0.01));
        let measurement = noisy(0.0, 0.0, -3.0, PlanarNoise::from_std_dev(0.02, 0.02));

        let n = nudge_pose(&sample, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(n.pose.heading_rad, 3.056637, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.008944, epsilon = 1e-6);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.018347, epsilon = 1e-6);
    }

    #[test]
    fn test_convergence() {
        // A correct camera at 50 Hz says we're 0.1 m off; the error decays
        // slowly as the state grows more confident
        let measurement = noisy(0.1, 0.0, 0.0, PlanarNoise::from_std_dev(0.05, f64::MAX));
        let mut n = noisy(0.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.01, 0.1));

        for _ in 0..50 {
            n = nudge_pose(&n, &measurement, FUSOR);
        }
        assert_abs_diff_eq!(0.1 - n.pose.x_m(), 0.019, epsilon = 0.001);
        assert_abs_diff_eq!(n.pose.y_m(), 0.0, epsilon = 0.001);
        assert_abs_diff_eq!(n.pose.heading_rad, 0.0, epsilon = 0.001);

        for _ in 0..50 {
            n = nudge_pose(&n, &measurement, FUSOR);
        }
        assert_abs_diff_eq!(0.1 - n.pose.x_m(), 0.009372, epsilon = 1e-6);
    }

    #[test]
    fn test_nudge_state() {
        let sample = SwerveState {
            pose: Pose2::default(),
            velocity: Velocity2 { vx_ms: 1.0, vy_ms: 0.0, omega_rads: 0.0 },
            noise: PlanarNoise::from_std_dev(1.0, 1.0),
            wheel_positions: WheelPositions([WheelPosition::new(0.3, Some(0.1)); 4]),
            gyro_yaw_rad: 0.4,
            gyro_bias: UncertainScalar::from_variance(0.0, 0.001),
        };

        // Uncertain history, confident camera: the camera wins
        let measurement = noisy(1.0, 0.0, 0.0, PlanarNoise::from_std_dev(0.01, 0.01));
        let n = nudge(&sample, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 1.0, epsilon = 0.001);
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.01, epsilon = 0.001);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.01, epsilon = 0.001);
        assert_eq!(n.velocity, sample.velocity);
        assert_eq!(n.wheel_positions, sample.wheel_positions);
        assert_eq!(n.gyro_yaw_rad, sample.gyro_yaw_rad);
        assert_eq!(n.gyro_bias, sample.gyro_bias);

        // Both confident: meet in the middle, with more cartesian variance
        let confident = SwerveState {
            noise: PlanarNoise::from_std_dev(0.01, 0.01),
            ..sample
        };
        let n = nudge(&confident, &measurement, FUSOR);
        assert_abs_diff_eq!(n.pose.x_m(), 0.5, epsilon = 0.001);
        assert_abs_diff_eq!(n.noise.cartesian_std_dev_m(), 0.071, epsilon = 0.001);
        assert_abs_diff_eq!(n.noise.rotation_std_dev_rad(), 0.007, epsilon = 0.001);
    }
}
