//! # Vision updater
//!
//! Applies delayed absolute-pose measurements to the history. A measurement
//! is taken at some time in the past, so the estimate at that time is nudged
//! towards it and every later entry is re-derived from its recorded wheel
//! motion.
//!
//! Each correction is recorded against its entry, and re-derivation replays
//! the recorded corrections as well as the odometry. Measurements at distinct
//! history timestamps therefore give the same result whatever order they
//! arrive in. Two measurements at the same timestamp are applied in arrival
//! order, and the result depends on that order.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod nudge;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    fusion::Fusor,
    geom::Pose2,
    history::History,
    odometry::OdometryUpdater,
    uncertainty::{NoisyPose, PlanarNoise},
};

pub use nudge::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A pose measurement from the vision system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisionMeasurement {
    /// Time the image was captured, in the control loop's clock.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    pub pose: Pose2,

    pub noise: PlanarNoise,
}

/// Vision correction state.
#[derive(Debug, Clone, Default)]
pub struct VisionUpdater {
    fusor: Fusor,

    /// Control-loop time at which the most recent measurement was accepted.
    last_correction_s: Option<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl VisionMeasurement {
    pub fn noisy_pose(&self) -> NoisyPose {
        NoisyPose::new(self.pose, self.noise)
    }
}

impl VisionUpdater {
    pub fn new(fusor: Fusor) -> Self {
        Self {
            fusor,
            last_correction_s: None,
        }
    }

    /// Apply a measurement to the history, accepted at control-loop time
    /// `now_s`. Returns false if it was too old to apply.
    ///
    /// A measurement stamped after the latest entry is applied at the latest
    /// entry, since there are no wheel positions for its own time.
    pub fn put(
        &mut self,
        history: &mut History,
        odometry: &OdometryUpdater,
        now_s: f64,
        measurement: &VisionMeasurement,
    ) -> bool {
        let mut timestamp_s = measurement.timestamp_s;

        if history.too_old(timestamp_s) {
            info!(
                "Dropping vision measurement at {:.3} s, older than the {:.3} s history",
                timestamp_s,
                history.horizon_s()
            );
            return false;
        }

        let latest_s = history.latest_timestamp_s();
        if timestamp_s > latest_s {
            debug!(
                "Vision measurement at {:.3} s is ahead of the latest entry, applying it at {:.3} s",
                timestamp_s, latest_s
            );
            timestamp_s = latest_s;
        }

        let sample = history.get_record(timestamp_s);
        let nudged = nudge(&sample, &measurement.noisy_pose(), self.fusor);

        history.put(timestamp_s, nudged);
        history.add_correction(timestamp_s, measurement.noisy_pose());
        let replayed = odometry.replay(history, timestamp_s);

        debug!(
            "Vision correction at {:.3} s moved the estimate {:.4} m, {:.4} rad, \
             replayed {} entries",
            timestamp_s,
            sample.pose.distance_m(&nudged.pose),
            sample.pose.heading_error_rad(&nudged.pose),
            replayed
        );

        self.last_correction_s = Some(match self.last_correction_s {
            Some(t) => t.max(now_s),
            None => now_s,
        });

        true
    }

    /// Time since the most recent measurement was accepted, or infinity if
    /// there hasn't been one since the last reset.
    ///
    /// Units: seconds
    pub fn pose_age_s(&self, now_s: f64) -> f64 {
        match self.last_correction_s {
            Some(t) => now_s - t,
            None => f64::INFINITY,
        }
    }

    /// Forget previous measurements, used when the history is reset.
    pub fn reset(&mut self) {
        self.last_correction_s = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        geom::Twist2,
        kinematics::{SwerveKinematics, WheelPosition, WheelPositions, NUM_MODULES},
        state::SwerveState,
        uncertainty::UncertainScalar,
    };
    use approx::assert_abs_diff_eq;

    struct Fixture {
        history: History,
        odometry: OdometryUpdater,
        vision: VisionUpdater,
    }

    /// Robot at the origin with 0.1 m noise, history 0.2 s long.
    fn fixture() -> Fixture {
        let kinematics = SwerveKinematics::square(0.5).unwrap();
        let seed = SwerveState {
            noise: PlanarNoise::from_std_dev(0.1, 0.1),
            wheel_positions: WheelPositions::zero(),
            gyro_bias: UncertainScalar::from_variance(0.0, 0.0),
            ..Default::default()
        };
        Fixture {
            history: History::new(kinematics.clone(), 0.2, 0.02, 0.0, seed),
            odometry: OdometryUpdater::new(kinematics, Default::default(), 0.0, Fusor::default()),
            vision: VisionUpdater::new(Fusor::default()),
        }
    }

    fn wheels(distance_m: f64) -> WheelPositions {
        WheelPositions([WheelPosition::new(distance_m, Some(0.0)); 4])
    }

    fn measurement(timestamp_s: f64) -> VisionMeasurement {
        VisionMeasurement {
            timestamp_s,
            pose: Pose2::new(1.0, 0.0, 0.0),
            noise: PlanarNoise::from_std_dev(0.5, f64::MAX),
        }
    }

    #[test]
    fn test_replay_propagates() {
        let mut f = fixture();
        f.odometry.update(&mut f.history, 0.02, &wheels(0.1), 0.0);
        assert_abs_diff_eq!(f.history.get_record(0.02).pose.x_m(), 0.1, epsilon = 1e-9);

        assert!(f.vision.put(&mut f.history, &f.odometry, 0.02, &measurement(0.0)));

        let t0 = f.history.get_record(0.0);
        assert_abs_diff_eq!(t0.pose.x_m(), 0.038, epsilon = 0.001);
        assert_abs_diff_eq!(t0.noise.cartesian_std_dev_m(), 0.102, epsilon = 0.001);

        // The later entry keeps its 0.1 m of odometry on top of the correction
        let t1 = f.history.get_record(0.02);
        assert_abs_diff_eq!(t1.pose.x_m(), t0.pose.x_m() + 0.1, epsilon = 1e-9);
        assert_abs_diff_eq!(t1.velocity.vx_ms, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_between_ticks() {
        let mut f = fixture();
        f.odometry.update(&mut f.history, 0.02, &wheels(0.1), 0.0);
        f.odometry.update(&mut f.history, 0.04, &wheels(0.2), 0.0);

        assert!(f.vision.put(&mut f.history, &f.odometry, 0.04, &measurement(0.03)));
        assert_eq!(f.history.len(), 4);

        // Interpolated sample at 0.15 nudged towards 1.0
        let t = f.history.get_record(0.03);
        assert!(t.pose.x_m() > 0.15 && t.pose.x_m() < 0.2);
        let t1 = f.history.get_record(0.04);
        assert_abs_diff_eq!(t1.pose.x_m(), t.pose.x_m() + 0.05, epsilon = 1e-9);
    }

    #[test]
    fn test_successive() {
        let mut f = fixture();
        let mut expected = [0.038, 0.077, 0.114].iter();
        for _ in 0..3 {
            f.vision.put(&mut f.history, &f.odometry, 0.0, &measurement(0.0));
            assert_abs_diff_eq!(
                f.history.get_record(0.0).pose.x_m(),
                *expected.next().unwrap(),
                epsilon = 0.001
            );
        }
        assert_eq!(f.history.corrections_at(0.0).len(), 3);
    }

    #[test]
    fn test_too_old() {
        let mut f = fixture();
        for i in 1..=20 {
            let t = i as f64 * 0.02;
            f.odometry.update(&mut f.history, t, &wheels(t), 0.0);
        }
        let before: Vec<SwerveState> = f.history.iter().map(|(_, e)| e.state).collect();

        assert!(!f.vision.put(&mut f.history, &f.odometry, 0.4, &measurement(0.1)));

        let after: Vec<SwerveState> = f.history.iter().map(|(_, e)| e.state).collect();
        assert_eq!(before, after);
        assert_eq!(f.vision.pose_age_s(0.4), f64::INFINITY);
    }

    #[test]
    fn test_out_of_order_convergence() {
        let tick = |i: usize| i as f64 * 0.02;

        let run = |order: &[usize]| {
            let mut f = fixture();
            for i in 1..=5 {
                f.odometry.update(&mut f.history, tick(i), &wheels(tick(i)), 0.0);
            }
            for &i in order {
                let m = VisionMeasurement {
                    timestamp_s: tick(i),
                    pose: Pose2::new(1.0 + tick(i), 0.5, 0.1),
                    noise: PlanarNoise::from_std_dev(0.2, 0.3),
                };
                assert!(f.vision.put(&mut f.history, &f.odometry, tick(5), &m));
            }
            f
        };

        let a = run(&[1, 3]);
        let b = run(&[3, 1]);

        assert_eq!(a.history.len(), b.history.len());
        for ((ta, ea), (tb, eb)) in a.history.iter().zip(b.history.iter()) {
            assert_eq!(ta, tb);
            assert_abs_diff_eq!(ea.state.pose.x_m(), eb.state.pose.x_m(), epsilon = 1e-12);
            assert_abs_diff_eq!(ea.state.pose.y_m(), eb.state.pose.y_m(), epsilon = 1e-12);
            assert_abs_diff_eq!(
                ea.state.pose.heading_rad, eb.state.pose.heading_rad, epsilon = 1e-12
            );
            assert_abs_diff_eq!(
                ea.state.noise.cartesian_variance,
                eb.state.noise.cartesian_variance,
                epsilon = 1e-12
            );
        }
        assert_abs_diff_eq!(a.vision.pose_age_s(0.15), 0.15 - tick(5), epsilon = 1e-12);
        assert_eq!(a.vision.pose_age_s(0.15), b.vision.pose_age_s(0.15));
    }

    #[test]
    fn test_pose_age_from_acceptance() {
        let mut f = fixture();
        f.odometry.update(&mut f.history, 0.02, &wheels(0.1), 0.0);
        f.odometry.update(&mut f.history, 0.04, &wheels(0.2), 0.0);

        // Captured at 0.0 but only delivered at 0.04
        assert!(f.vision.put(&mut f.history, &f.odometry, 0.04, &measurement(0.0)));
        assert_abs_diff_eq!(f.vision.pose_age_s(0.05), 0.01, epsilon = 1e-12);

        // An older capture accepted later still refreshes the age
        assert!(f.vision.put(&mut f.history, &f.odometry, 0.06, &measurement(0.02)));
        assert_abs_diff_eq!(f.vision.pose_age_s(0.06), 0.0, epsilon = 1e-12);

        f.vision.reset();
        assert_eq!(f.vision.pose_age_s(0.06), f64::INFINITY);
    }

    #[test]
    fn test_ahead_of_latest_entry() {
        let mut f = fixture();
        f.odometry.update(&mut f.history, 0.02, &wheels(0.1), 0.0);
        let before = f.history.get_record(0.02);

        assert!(f.vision.put(&mut f.history, &f.odometry, 0.02, &measurement(0.05)));

        // Applied at the latest entry rather than inserting a new one
        assert_eq!(f.history.len(), 2);
        assert_eq!(f.history.latest_timestamp_s(), 0.02);
        assert_eq!(f.history.corrections_at(0.02).len(), 1);
        assert!(f.history.corrections_at(0.05).is_empty());
        let after = f.history.get_record(0.02);
        assert!(after.pose.x_m() > before.pose.x_m());
        assert_eq!(after.wheel_positions, before.wheel_positions);

        // The next tick integrates from the corrected entry
        f.odometry.update(&mut f.history, 0.04, &wheels(0.2), 0.0);
        assert_abs_diff_eq!(
            f.history.get_record(0.04).pose.x_m(),
            after.pose.x_m() + 0.1,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_simultaneous_measurements() {
        let mut f = fixture();
        let noise = PlanarNoise::from_std_dev(0.9, 0.9);
        let poses = [
            Pose2::new(0.0, 0.0, 0.0),
            Pose2::new(3.0, 1.0, std::f64::consts::FRAC_PI_2),
            Pose2::new(2.0, 4.0, -std::f64::consts::PI),
        ];

        for _ in 0..1000 {
            for pose in poses.iter() {
                let m = VisionMeasurement { timestamp_s: 0.0, pose: *pose, noise };
                assert!(f.vision.put(&mut f.history, &f.odometry, 0.0, &m));
            }
        }
        assert_eq!(f.history.corrections_at(0.0).len(), 3000);

        // Every measurement pulls on the estimate, so it doesn't settle on
        // whichever one came last
        let estimate = f.history.get_record(0.0).pose;
        for pose in poses.iter() {
            assert!(
                estimate.distance_m(pose) > 0.08
                    || estimate.heading_error_rad(pose).abs() > 0.08
            );
        }
    }

    #[test]
    fn test_simultaneous_order_matters() {
        let left = VisionMeasurement {
            timestamp_s: 0.0,
            pose: Pose2::new(-1.0, 0.0, 0.0),
            noise: PlanarNoise::from_std_dev(0.5, f64::MAX),
        };
        let right = VisionMeasurement {
            pose: Pose2::new(1.0, 0.0, 0.0),
            ..left
        };

        let run = |first: &VisionMeasurement, second: &VisionMeasurement| {
            let mut f = fixture();
            assert!(f.vision.put(&mut f.history, &f.odometry, 0.0, first));
            assert!(f.vision.put(&mut f.history, &f.odometry, 0.0, second));
            f.history.get_record(0.0).pose.x_m()
        };

        let left_first = run(&left, &right);
        let right_first = run(&right, &left);

        assert!((left_first - right_first).abs() > 1e-6);
        // Mirror images of each other
        assert_abs_diff_eq!(left_first, -right_first, epsilon = 1e-12);
    }

    #[test]
    fn test_correction_across_gyro_seam() {
        let mut f = fixture();
        let kinematics = SwerveKinematics::square(0.5).unwrap();

        // Spin on the spot from 3.1 rad through the seam, wheels and gyro
        // agreeing on the rotation
        let dtheta_rad = 2.0 * std::f64::consts::PI - 6.2;
        let deltas = kinematics.to_deltas(&Twist2::new(0.0, 0.0, dtheta_rad), &[0.0; NUM_MODULES]);
        let mut start = WheelPositions::zero();
        for (p, d) in start.0.iter_mut().zip(deltas.0.iter()) {
            p.angle_rad = d.angle_rad;
        }
        let end = start.plus(&deltas);

        f.odometry.reset(
            &mut f.history,
            Pose2::new(0.0, 0.0, 3.1),
            PlanarNoise::from_std_dev(0.1, 0.1),
            0.0,
            &start,
            3.1,
            UncertainScalar::from_variance(0.0, 0.0),
        );
        f.odometry.update(&mut f.history, 0.02, &end, -3.1);
        let before = f.history.get_record(0.02).pose;
        assert_abs_diff_eq!(before.heading_rad, -3.1, epsilon = 1e-9);

        // A measurement agreeing with the estimate between the ticks
        let sample = f.history.get_record(0.01);
        let m = VisionMeasurement {
            timestamp_s: 0.01,
            pose: sample.pose,
            noise: PlanarNoise::from_std_dev(0.1, 0.1),
        };
        assert!(f.vision.put(&mut f.history, &f.odometry, 0.02, &m));

        let after = f.history.get_record(0.02).pose;
        assert!(before.heading_error_rad(&after).abs() < 1e-9);
    }
}
