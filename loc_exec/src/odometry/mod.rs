//! # Odometry updater
//!
//! Integrates wheel and gyro readings into the history, one entry per control
//! tick, and re-derives entries after a correction.
//!
//! Rotation comes from both the wheels and the gyro. The wheels are good at
//! low speed and bad when slipping at high speed; the gyro is the reverse,
//! drifting slowly but unaffected by slip. The two are blended by their
//! variances for each sample.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{info, trace};

use util::maths::wrap_pi;

use crate::{
    fusion::Fusor,
    geom::{Pose2, Twist2, Velocity2},
    history::History,
    kinematics::{SwerveKinematics, WheelPositions},
    state::SwerveState,
    uncertainty::{OdometryNoiseModel, PlanarNoise, UncertainScalar},
    vision::nudge_all,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Odometry integration.
#[derive(Debug, Clone)]
pub struct OdometryUpdater {
    kinematics: SwerveKinematics,

    noise_model: OdometryNoiseModel,

    /// Gyro rate white noise standard deviation.
    ///
    /// Units: radians/second
    gyro_white_noise_rads: f64,

    /// Used to re-apply recorded vision corrections.
    fusor: Fusor,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OdometryUpdater {
    pub fn new(
        kinematics: SwerveKinematics,
        noise_model: OdometryNoiseModel,
        gyro_white_noise_rads: f64,
        fusor: Fusor,
    ) -> Self {
        Self {
            kinematics,
            noise_model,
            gyro_white_noise_rads,
            fusor,
        }
    }

    pub fn set_gyro_white_noise_rads(&mut self, gyro_white_noise_rads: f64) {
        self.gyro_white_noise_rads = gyro_white_noise_rads;
    }

    /// Add an entry at `now_s` from the current sensor readings and return
    /// the new state.
    ///
    /// The entry is integrated from the latest entry before `now_s`. If there
    /// is none the state at `now_s` is used with no time elapsed. Corrections
    /// already recorded at `now_s` are re-applied, and if `now_s` is not the
    /// latest time the entries after it are re-derived.
    pub fn update(
        &self,
        history: &mut History,
        now_s: f64,
        wheel_positions: &WheelPositions,
        gyro_yaw_rad: f64,
    ) -> SwerveState {
        let state = {
            let stepped = match history.floor_before(now_s) {
                Some((prev_s, prev)) => {
                    self.step(prev_s, prev, now_s, wheel_positions, gyro_yaw_rad)
                }
                None => {
                    let prev = history.get_record(now_s);
                    self.step(now_s, &prev, now_s, wheel_positions, gyro_yaw_rad)
                }
            };
            nudge_all(&stepped, history.corrections_at(now_s), self.fusor)
        };

        history.put(now_s, state);

        if now_s < history.latest_timestamp_s() {
            self.replay(history, now_s);
        }

        state
    }

    /// Re-derive every entry after `timestamp_s` from its recorded wheel
    /// positions and gyro yaw, re-applying its recorded corrections. Returns
    /// the number of entries re-derived.
    pub fn replay(&self, history: &mut History, timestamp_s: f64) -> usize {
        history.rederive_after(timestamp_s, |prev_s, prev, t, entry| {
            let stepped = self.step(
                prev_s,
                prev,
                t,
                &entry.state.wheel_positions,
                entry.state.gyro_yaw_rad,
            );
            nudge_all(&stepped, &entry.corrections, self.fusor)
        })
    }

    /// Clear the history and seed it with a known pose.
    #[allow(clippy::too_many_arguments)]
    pub fn reset(
        &self,
        history: &mut History,
        pose: Pose2,
        noise: PlanarNoise,
        timestamp_s: f64,
        wheel_positions: &WheelPositions,
        gyro_yaw_rad: f64,
        gyro_bias: UncertainScalar,
    ) {
        info!(
            "Resetting pose to ({:.3}, {:.3}, {:.3}) at {:.3} s",
            pose.x_m(),
            pose.y_m(),
            pose.heading_rad,
            timestamp_s
        );

        history.reset(
            timestamp_s,
            SwerveState {
                pose,
                velocity: Velocity2::default(),
                noise,
                wheel_positions: *wheel_positions,
                gyro_yaw_rad,
                gyro_bias,
            },
        );
    }

    /// One integration step from `prev` at `prev_s` to `now_s`.
    pub fn step(
        &self,
        prev_s: f64,
        prev: &SwerveState,
        now_s: f64,
        wheel_positions: &WheelPositions,
        gyro_yaw_rad: f64,
    ) -> SwerveState {
        let dt_s = now_s - prev_s;

        let wheel_twist = self
            .kinematics
            .to_twist(&prev.wheel_positions.delta_to(wheel_positions));

        // Gyro rotation with the estimated drift removed
        let gyro_dtheta_rad =
            wrap_pi(gyro_yaw_rad - prev.gyro_yaw_rad) - prev.gyro_bias.mean * dt_s;
        let gyro_variance = (self.gyro_white_noise_rads * dt_s).powi(2)
            + prev.gyro_bias.variance * dt_s * dt_s;

        let dtheta_rad = self.mix(&wheel_twist, gyro_dtheta_rad, gyro_variance);
        let twist = wheel_twist.with_dtheta(dtheta_rad);
        let pose = prev.pose.exp(&twist);

        trace!(
            "Odometry {:.3} s: wheel dtheta {:.5}, gyro dtheta {:.5}, mixed {:.5}",
            now_s,
            wheel_twist.dtheta_rad,
            gyro_dtheta_rad,
            dtheta_rad
        );

        SwerveState {
            pose,
            velocity: Velocity2::from_twist(&wheel_twist, pose.heading_rad, dt_s),
            noise: prev.noise + self.noise_model.sample_noise(twist.norm_m(), dtheta_rad),
            wheel_positions: *wheel_positions,
            gyro_yaw_rad,
            gyro_bias: prev.gyro_bias,
        }
    }

    /// Blend the wheel and gyro rotations of one sample.
    ///
    /// The wheel variance `q` comes from the odometry noise model for this
    /// sample's motion, and `gyro_variance` is `r`. The gyro weight is
    /// `q / (q + sqrt(q r))`, so a robot at rest trusts its wheels and a
    /// fast-moving one trusts the gyro.
    pub fn mix(&self, wheel_twist: &Twist2, gyro_dtheta_rad: f64, gyro_variance: f64) -> f64 {
        let q = self
            .noise_model
            .rotation_std_dev(wheel_twist.norm_m(), wheel_twist.dtheta_rad)
            .powi(2);

        let k = if q == 0.0 {
            0.0
        }
        else {
            q / (q + (q * gyro_variance).sqrt())
        };

        (1.0 - k) * wheel_twist.dtheta_rad + k * gyro_dtheta_rad
    }
}
