//! # Localisation manager
//!
//! The public face of localisation. It owns the pose history and both
//! updaters, reads the sensors each control cycle and answers pose queries
//! from the trajectory follower.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LocMgr operation.
#[derive(Debug, thiserror::Error)]
pub enum LocMgrError {
    #[error("Invalid drive geometry: {0}")]
    Kinematics(#[from] crate::kinematics::KinematicsError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Cannot create the LocMgr archives: {0}")]
    ArchiveInitError(String),
}
