//! Implementations for the LocMgr state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::{LocMgrError, Params};
use crate::{
    geom::Pose2,
    history::History,
    kinematics::{SwerveKinematics, WheelPositions},
    odometry::OdometryUpdater,
    sensors::{Gyro, WheelEncoders},
    state::SwerveState,
    uncertainty::{PlanarNoise, UncertainScalar},
    vision::{VisionMeasurement, VisionUpdater},
};
use util::{
    archive::{Archived, Archiver},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Localisation manager state
pub struct LocMgr {
    pub(crate) params: Params,

    history: History,
    odometry: OdometryUpdater,
    vision: VisionUpdater,

    pub(crate) report: StatusReport,
    arch_report: Archiver,

    output: Option<OutputData>,
    arch_output: Archiver,
}

/// Input data to LocMgr for one cycle.
#[derive(Debug, Clone, Default)]
pub struct InputData {
    /// Units: seconds
    pub time_s: f64,

    pub wheel_positions: WheelPositions,

    /// Units: radians
    pub gyro_yaw_rad: f64,

    /// Units: radians/second
    pub gyro_yaw_rate_rads: f64,

    /// Gyro rate white noise standard deviation.
    ///
    /// Units: radians/second
    pub gyro_white_noise_rads: f64,

    /// Vision measurements delivered since the last cycle.
    pub vision: Vec<VisionMeasurement>,
}

/// The estimate produced each cycle, flattened for archiving.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OutputData {
    pub time_s: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub heading_rad: f64,
    pub vx_ms: f64,
    pub vy_ms: f64,
    pub omega_rads: f64,
    pub cartesian_std_dev_m: f64,
    pub rotation_std_dev_rad: f64,
}

/// Status report for LocMgr processing.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct StatusReport {
    pub num_vision_accepted: usize,
    pub num_vision_dropped: usize,
    pub history_len: usize,

    /// Units: seconds
    pub pose_age_s: f64,

    /// Measured rate, reported but not used by the estimator.
    ///
    /// Units: radians/second
    pub gyro_yaw_rate_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LocMgr {
    /// Create the manager. Until the first reset the pose is the origin with
    /// practically infinite noise, so the first vision measurement takes
    /// over.
    pub fn new(params: Params) -> Result<Self, LocMgrError> {
        params.validate()?;

        let kinematics = SwerveKinematics::new(params.module_pos_m_rb)?;
        let seed = SwerveState {
            noise: PlanarNoise::high(),
            wheel_positions: WheelPositions::zero(),
            gyro_bias: initial_gyro_bias(&params),
            ..Default::default()
        };

        Ok(Self {
            history: History::new(
                kinematics.clone(),
                params.history_horizon_s,
                params.nominal_period_s,
                0.0,
                seed,
            ),
            odometry: OdometryUpdater::new(
                kinematics,
                params.odometry_noise,
                0.0,
                params.vision_fusor,
            ),
            vision: VisionUpdater::new(params.vision_fusor),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
            output: None,
            arch_output: Archiver::default(),
            params,
        })
    }

    /// The estimate at `timestamp_s`, or the latest estimate if `None`.
    pub fn get_estimate(&self, timestamp_s: Option<f64>) -> SwerveState {
        match timestamp_s {
            Some(t) => self.history.get_record(t),
            None => *self.history.latest().1,
        }
    }

    /// Restart localisation from a known pose, reading the sensors for the
    /// new reference.
    pub fn reset<E, G>(
        &mut self,
        pose: Pose2,
        noise: PlanarNoise,
        timestamp_s: f64,
        encoders: &E,
        gyro: &G,
    )
    where
        E: WheelEncoders,
        G: Gyro,
    {
        self.use_gyro(gyro);
        self.odometry.reset(
            &mut self.history,
            pose,
            noise,
            timestamp_s,
            &encoders.wheel_positions(),
            gyro.yaw_rad(),
            initial_gyro_bias(&self.params),
        );
        self.vision.reset();
    }

    /// Time since a vision measurement was last accepted.
    ///
    /// Units: seconds
    pub fn get_pose_age_s(&self, now_s: f64) -> f64 {
        self.vision.pose_age_s(now_s)
    }

    /// Integrate the current sensor readings at `now_s`.
    pub fn update_odometry<E, G>(&mut self, now_s: f64, encoders: &E, gyro: &G) -> SwerveState
    where
        E: WheelEncoders,
        G: Gyro,
    {
        self.use_gyro(gyro);
        self.odometry.update(
            &mut self.history,
            now_s,
            &encoders.wheel_positions(),
            gyro.yaw_rad(),
        )
    }

    /// Apply a vision measurement delivered at `now_s`, returning whether it
    /// was used.
    pub fn put_vision(&mut self, now_s: f64, measurement: &VisionMeasurement) -> bool {
        self.vision
            .put(&mut self.history, &self.odometry, now_s, measurement)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Pick up the gyro's noise figure.
    fn use_gyro<G: Gyro>(&mut self, gyro: &G) {
        self.odometry.set_gyro_white_noise_rads(gyro.white_noise_rads());
    }
}

impl State for LocMgr {
    type InitData = ();
    type InitError = LocMgrError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = LocMgrError;

    /// Initialise the LocMgr archives.
    fn init(&mut self, _init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        session
            .create_arch_dir("loc_mgr")
            .map_err(|e| LocMgrError::ArchiveInitError(e.to_string()))?;

        self.arch_report = Archiver::from_path(session, "loc_mgr/status_report.csv")
            .map_err(|e| LocMgrError::ArchiveInitError(e.to_string()))?;
        self.arch_output = Archiver::from_path(session, "loc_mgr/estimate.csv")
            .map_err(|e| LocMgrError::ArchiveInitError(e.to_string()))?;

        Ok(())
    }

    /// Perform cyclic processing of localisation: integrate odometry, then
    /// apply any delivered vision measurements.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        self.report = StatusReport::default();

        self.odometry
            .set_gyro_white_noise_rads(input_data.gyro_white_noise_rads);
        self.odometry.update(
            &mut self.history,
            input_data.time_s,
            &input_data.wheel_positions,
            input_data.gyro_yaw_rad,
        );

        for m in input_data.vision.iter() {
            if self.put_vision(input_data.time_s, m) {
                self.report.num_vision_accepted += 1;
            }
            else {
                self.report.num_vision_dropped += 1;
            }
        }

        if !input_data.vision.is_empty() {
            debug!(
                "{} vision measurements, {} accepted",
                input_data.vision.len(),
                self.report.num_vision_accepted
            );
        }

        let estimate = self.get_estimate(Some(input_data.time_s));
        let output = OutputData::new(input_data.time_s, &estimate);

        self.report.history_len = self.history.len();
        self.report.pose_age_s = self.get_pose_age_s(input_data.time_s);
        self.report.gyro_yaw_rate_rads = input_data.gyro_yaw_rate_rads;

        trace!("LocMgr output: {:?}", output);

        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for LocMgr {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.arch_report.serialise(self.report)?;
        if let Some(output) = self.output {
            self.arch_output.serialise(output)?;
        }
        Ok(())
    }
}

impl OutputData {
    fn new(time_s: f64, state: &SwerveState) -> Self {
        Self {
            time_s,
            x_m: state.pose.x_m(),
            y_m: state.pose.y_m(),
            heading_rad: state.pose.heading_rad,
            vx_ms: state.velocity.vx_ms,
            vy_ms: state.velocity.vy_ms,
            omega_rads: state.velocity.omega_rads,
            cartesian_std_dev_m: state.noise.cartesian_std_dev_m(),
            rotation_std_dev_rad: state.noise.rotation_std_dev_rad(),
        }
    }
}

fn initial_gyro_bias(params: &Params) -> UncertainScalar {
    UncertainScalar::from_std_dev(params.gyro_bias_rads, params.gyro_bias_std_dev_rads)
}
