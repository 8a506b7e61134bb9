//! # Swerve kinematics
//!
//! Wheel odometry for a four-module swerve drive. Each module reports the
//! distance its wheel has rolled and the (unwrapped) steering angle, and the
//! forward kinematics turns the per-module deltas between two samples into a
//! robot-frame twist.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod swerve;
mod wheels;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use swerve::*;
pub use wheels::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of swerve modules, in order front-left, front-right, rear-left,
/// rear-right.
pub const NUM_MODULES: usize = 4;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors that can occur when building the kinematics.
#[derive(Debug, thiserror::Error)]
pub enum KinematicsError {
    #[error("The module positions {0:?} do not determine a unique twist")]
    SingularGeometry([[f64; 2]; NUM_MODULES]),
}
