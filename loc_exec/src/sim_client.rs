//! # Simulation client
//!
//! A simulated swerve drive with noisy wheel encoders, a drifting gyro and a
//! camera that sees a single fiducial tag, delivering its pose measurements
//! after a processing latency.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;
use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::StandardNormal;
use serde::Deserialize;
use std::collections::VecDeque;

use util::maths::{get_ang_dist, wrap_pi};

use crate::{
    geom::{Pose2, Twist2},
    kinematics::{SwerveKinematics, WheelPositions, NUM_MODULES},
    sensors::{Gyro, WheelEncoders},
    uncertainty::{vision_measurement_noise, OdometryNoiseModel, UncertaintyError},
    vision::VisionMeasurement,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters of the simulation.
#[derive(Debug, Clone, Deserialize)]
pub struct SimParams {
    /// Length of the simulated run.
    ///
    /// Units: seconds
    pub duration_s: f64,

    /// Seed of the noise generator, or 0 for a random seed.
    pub rng_seed: u64,

    /// Start pose, `[x_m, y_m, heading_rad]`.
    pub initial_pose: [f64; 3],

    // ---- DRIVE PROFILE ----

    /// Forward speed of the robot.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Sideways speed of the robot.
    ///
    /// Units: meters/second
    pub strafe_ms: f64,

    /// Yaw rate of the robot.
    ///
    /// Units: radians/second
    pub yaw_rate_rads: f64,

    // ---- SENSOR NOISE ----

    /// Scale applied to the odometry noise model when perturbing the wheels.
    /// 0 gives perfect wheels.
    pub wheel_noise_scale: f64,

    /// Units: radians/second
    pub gyro_white_noise_rads: f64,

    /// Units: radians/second
    pub gyro_bias_noise_rads: f64,

    /// Constant gyro drift.
    ///
    /// Units: radians/second
    pub gyro_drift_rads: f64,

    // ---- CAMERA ----

    /// Time between camera frames.
    ///
    /// Units: seconds
    pub vision_period_s: f64,

    /// Time between capturing a frame and delivering its measurement.
    ///
    /// Units: seconds
    pub vision_latency_s: f64,

    /// Position of the tag in the field.
    ///
    /// Units: meters
    pub tag_pos_m: [f64; 2],

    /// Direction the tag faces.
    ///
    /// Units: radians
    pub tag_normal_rad: f64,
}

/// Simulated robot and sensors.
pub struct SimClient {
    params: SimParams,
    kinematics: SwerveKinematics,
    odometry_noise: OdometryNoiseModel,
    rng: SmallRng,

    time_s: f64,
    truth: Pose2,

    wheel_positions: WheelPositions,
    gyro_yaw_rad: f64,
    gyro_yaw_rate_rads: f64,

    last_capture_s: Option<f64>,

    /// Captured measurements waiting out their latency, with delivery time.
    in_flight: VecDeque<(f64, VisionMeasurement)>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SimClientError {
    #[error("Simulation step must be positive, got {0} s")]
    InvalidStep(f64),

    #[error("Cannot model the vision noise: {0}")]
    VisionNoise(#[from] UncertaintyError),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimClient {
    pub fn new(params: SimParams, kinematics: SwerveKinematics) -> Self {
        let rng = if params.rng_seed == 0 {
            SmallRng::from_entropy()
        }
        else {
            SmallRng::seed_from_u64(params.rng_seed)
        };

        let [x, y, h] = params.initial_pose;

        Self {
            kinematics,
            odometry_noise: OdometryNoiseModel::default(),
            rng,
            time_s: 0.0,
            truth: Pose2::new(x, y, h),
            wheel_positions: WheelPositions::zero(),
            gyro_yaw_rad: 0.0,
            gyro_yaw_rate_rads: 0.0,
            last_capture_s: None,
            in_flight: VecDeque::new(),
            params,
        }
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    /// The true pose of the robot.
    pub fn truth(&self) -> Pose2 {
        self.truth
    }

    /// Advance the simulation by `dt_s`, returning the vision measurements
    /// delivered during the step.
    pub fn step(&mut self, dt_s: f64) -> Result<Vec<VisionMeasurement>, SimClientError> {
        if dt_s <= 0.0 {
            return Err(SimClientError::InvalidStep(dt_s));
        }

        self.time_s += dt_s;

        // ---- TRUTH ----

        let twist = Twist2::new(
            self.params.speed_ms * dt_s,
            self.params.strafe_ms * dt_s,
            self.params.yaw_rate_rads * dt_s,
        );
        self.truth = self.truth.exp(&twist);

        // ---- WHEELS ----

        let scale = self.params.wheel_noise_scale;
        let cartesian_sd = scale * self.odometry_noise.cartesian_std_dev(twist.norm_m());
        let rotation_sd = scale
            * self
                .odometry_noise
                .rotation_std_dev(twist.norm_m(), twist.dtheta_rad);
        let measured_twist = Twist2::new(
            twist.dx_m + self.gaussian(cartesian_sd),
            twist.dy_m + self.gaussian(cartesian_sd),
            twist.dtheta_rad + self.gaussian(rotation_sd),
        );

        let mut previous_angles_rad = [0f64; NUM_MODULES];
        for (a, p) in previous_angles_rad
            .iter_mut()
            .zip(self.wheel_positions.0.iter())
        {
            *a = p.angle_rad.unwrap_or(0.0);
        }

        let mut deltas = self.kinematics.to_deltas(&measured_twist, &previous_angles_rad);
        // Keep the steering angles continuous
        for (d, prev) in deltas.0.iter_mut().zip(previous_angles_rad.iter()) {
            if let Some(a) = d.angle_rad {
                d.angle_rad = Some(prev + get_ang_dist(*prev, a));
            }
        }
        self.wheel_positions = self.wheel_positions.plus(&deltas);

        // ---- GYRO ----

        let rate_noise_rads = self.gaussian(self.params.gyro_white_noise_rads);
        self.gyro_yaw_rad = wrap_pi(
            self.gyro_yaw_rad
                + twist.dtheta_rad
                + (self.params.gyro_drift_rads + rate_noise_rads) * dt_s,
        );
        self.gyro_yaw_rate_rads = twist.dtheta_rad / dt_s;

        // ---- CAMERA ----

        let capture_due = match self.last_capture_s {
            Some(t) => self.time_s - t >= self.params.vision_period_s - 1e-9,
            None => true,
        };
        if capture_due {
            self.last_capture_s = Some(self.time_s);
            if let Some(m) = self.capture()? {
                self.in_flight
                    .push_back((self.time_s + self.params.vision_latency_s, m));
            }
        }

        let mut delivered = Vec::new();
        while let Some((deliver_s, _)) = self.in_flight.front() {
            if *deliver_s > self.time_s + 1e-9 {
                break;
            }
            if let Some((_, m)) = self.in_flight.pop_front() {
                delivered.push(m);
            }
        }

        Ok(delivered)
    }

    /// Measure the robot pose from the tag, or `None` if the tag is behind
    /// the camera's side of the tag.
    fn capture(&mut self) -> Result<Option<VisionMeasurement>, SimClientError> {
        let tag = Pose2::new(
            self.params.tag_pos_m[0],
            self.params.tag_pos_m[1],
            self.params.tag_normal_rad,
        );

        let offset = self.truth.position_m - tag.position_m;
        let distance_m = offset.norm();
        let bearing_rad = offset.y.atan2(offset.x);
        let off_axis_rad = get_ang_dist(tag.heading_rad, bearing_rad).abs();

        if off_axis_rad >= std::f64::consts::FRAC_PI_2 {
            return Ok(None);
        }

        let noise = vision_measurement_noise(distance_m, off_axis_rad)?;

        // Unbounded noise means the reading carries no information
        let cartesian_sd = finite_or_zero(noise.cartesian_std_dev_m());
        let rotation_sd = finite_or_zero(noise.rotation_std_dev_rad());

        let pose = Pose2::new(
            self.truth.x_m() + self.gaussian(cartesian_sd),
            self.truth.y_m() + self.gaussian(cartesian_sd),
            self.truth.heading_rad + self.gaussian(rotation_sd),
        );

        trace!(
            "Captured tag at {:.2} m, {:.1} deg off axis",
            distance_m,
            off_axis_rad.to_degrees()
        );

        Ok(Some(VisionMeasurement {
            timestamp_s: self.time_s,
            pose,
            noise,
        }))
    }

    fn gaussian(&mut self, std_dev: f64) -> f64 {
        if std_dev == 0.0 {
            return 0.0;
        }
        let n: f64 = self.rng.sample(StandardNormal);
        n * std_dev
    }
}

impl WheelEncoders for SimClient {
    fn wheel_positions(&self) -> WheelPositions {
        self.wheel_positions
    }
}

impl Gyro for SimClient {
    fn yaw_rad(&self) -> f64 {
        self.gyro_yaw_rad
    }

    fn yaw_rate_rads(&self) -> f64 {
        self.gyro_yaw_rate_rads
    }

    fn white_noise_rads(&self) -> f64 {
        self.params.gyro_white_noise_rads
    }

    fn bias_noise_rads(&self) -> f64 {
        self.params.gyro_bias_noise_rads
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            duration_s: 10.0,
            rng_seed: 1,
            initial_pose: [0.0, 0.0, 0.0],
            speed_ms: 1.0,
            strafe_ms: 0.0,
            yaw_rate_rads: 0.2,
            wheel_noise_scale: 1.0,
            gyro_white_noise_rads: 0.004,
            gyro_bias_noise_rads: 1e-5,
            gyro_drift_rads: 0.0,
            vision_period_s: 0.1,
            vision_latency_s: 0.06,
            tag_pos_m: [8.0, 0.0],
            tag_normal_rad: std::f64::consts::PI,
        }
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    }
    else {
        0.0
    }
}
