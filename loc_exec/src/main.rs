//! Localisation executable entry point.
//!
//! Runs the localisation manager in a simulated control loop:
//!
//!     - Initialise session, logging, parameters and modules
//!     - Main loop, once per nominal period of simulated time:
//!         - Step the simulated drive and sensors
//!         - Localisation processing
//!         - Archive the estimate and the truth
//!     - Report the estimate's error against the truth

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use serde::Serialize;

// Internal
use loc_lib::{
    kinematics::SwerveKinematics,
    loc_mgr::{self, InputData, LocMgr},
    sensors::{Gyro, WheelEncoders},
    sim_client::{SimClient, SimParams},
    uncertainty::PlanarNoise,
};
use util::{
    archive::{Archived, Archiver},
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of cycles between summary log messages.
const SUMMARY_CYCLES: u64 = 50;

/// Initial noise of the pose the robot is placed at.
const INITIAL_CARTESIAN_STD_DEV_M: f64 = 0.05;
const INITIAL_ROTATION_STD_DEV_RAD: f64 = 0.02;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Truth against estimate, archived each cycle.
#[derive(Serialize)]
struct ErrorRecord {
    time_s: f64,
    truth_x_m: f64,
    truth_y_m: f64,
    truth_heading_rad: f64,
    position_error_m: f64,
    heading_error_rad: f64,
    cartesian_std_dev_m: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("loc_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(
        LevelFilter::Debug,
        &[("loc_lib::history", LevelFilter::Info)],
        &session,
    )
    .wrap_err("Failed to initialise logging")?;

    info!("Swerve Localisation Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params: loc_mgr::Params = util::params::load("loc_mgr.toml")
        .wrap_err("Could not load LocMgr params")?;
    let sim_params: SimParams = util::params::load("sim.toml")
        .wrap_err("Could not load simulation params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut sim = SimClient::new(
        sim_params.clone(),
        SwerveKinematics::new(params.module_pos_m_rb)
            .wrap_err("Invalid module positions")?,
    );

    let mut loc_mgr = LocMgr::new(params.clone())
        .wrap_err("Failed to create LocMgr")?;
    loc_mgr.init((), &session)
        .wrap_err("Failed to initialise LocMgr")?;
    info!("LocMgr init complete");

    let mut arch_error = Archiver::from_path(&session, "loc_mgr/error.csv")
        .map_err(|e| color_eyre::eyre::eyre!("{}", e))
        .wrap_err("Failed to create the error archive")?;

    loc_mgr.reset(
        sim.truth(),
        PlanarNoise::from_std_dev(INITIAL_CARTESIAN_STD_DEV_M, INITIAL_ROTATION_STD_DEV_RAD),
        sim.time_s(),
        &sim,
        &sim,
    );

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Beginning main loop\n");

    let mut num_cycles: u64 = 0;
    let mut sum_sq_error_m2 = 0.0;
    let mut num_vision_accepted = 0;
    let mut num_vision_dropped = 0;

    while sim.time_s() < sim_params.duration_s {
        let vision = sim.step(params.nominal_period_s)
            .wrap_err("Simulation step failed")?;

        let input = InputData {
            time_s: sim.time_s(),
            wheel_positions: sim.wheel_positions(),
            gyro_yaw_rad: sim.yaw_rad(),
            gyro_yaw_rate_rads: sim.yaw_rate_rads(),
            gyro_white_noise_rads: sim.white_noise_rads(),
            vision,
        };

        let (output, report) = loc_mgr.proc(&input)
            .wrap_err("LocMgr processing failed")?;

        num_vision_accepted += report.num_vision_accepted;
        num_vision_dropped += report.num_vision_dropped;

        let truth = sim.truth();
        let position_error_m = (output.x_m - truth.x_m()).hypot(output.y_m - truth.y_m());
        let heading_error_rad = util::maths::get_ang_dist(truth.heading_rad, output.heading_rad);
        sum_sq_error_m2 += position_error_m * position_error_m;

        // ---- ARCHIVE ----

        if let Err(e) = loc_mgr.write() {
            warn!("Could not write LocMgr archives: {}", e);
        }
        if let Err(e) = arch_error.serialise(ErrorRecord {
            time_s: input.time_s,
            truth_x_m: truth.x_m(),
            truth_y_m: truth.y_m(),
            truth_heading_rad: truth.heading_rad,
            position_error_m,
            heading_error_rad,
            cartesian_std_dev_m: output.cartesian_std_dev_m,
        }) {
            warn!("Could not write the error archive: {}", e);
        }

        num_cycles += 1;

        if num_cycles % SUMMARY_CYCLES == 0 {
            info!(
                "{:6.2} s: estimate ({:.3}, {:.3}, {:.3}) error {:.3} m, {:.4} rad, pose age {:.2} s",
                input.time_s,
                output.x_m,
                output.y_m,
                output.heading_rad,
                position_error_m,
                heading_error_rad,
                report.pose_age_s
            );
        }
    }

    // ---- SUMMARY ----

    let rms_error_m = if num_cycles > 0 {
        (sum_sq_error_m2 / num_cycles as f64).sqrt()
    }
    else {
        0.0
    };

    info!("End of simulation after {} cycles", num_cycles);
    info!(
        "    Vision measurements: {} accepted, {} dropped",
        num_vision_accepted, num_vision_dropped
    );
    info!("    RMS position error: {:.4} m", rms_error_m);

    Ok(())
}
