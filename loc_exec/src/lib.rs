//! # Swerve localisation library
//!
//! Fuses wheel odometry, a gyro and delayed vision measurements into a pose
//! estimate for a four-module swerve drive.
//!
//! The core is the pose history (`history`): a short, time-indexed record of
//! estimates which the odometry updater (`odometry`) appends to every control
//! cycle, and which the vision updater (`vision`) corrects in the past before
//! re-deriving everything after the correction. `loc_mgr` wraps the lot.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod fusion;
pub mod geom;
pub mod history;
pub mod kinematics;
pub mod loc_mgr;
pub mod odometry;
pub mod sensors;
pub mod sim_client;
pub mod state;
pub mod uncertainty;
pub mod vision;
