//! # Uncertainty primitives
//!
//! Scalar and planar uncertainty types used throughout localisation, plus the
//! empirical noise models for odometry and vision measurements.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod models;
mod planar;
mod scalar;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use models::*;
pub use planar::*;
pub use scalar::*;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised by the noise models.
#[derive(Debug, thiserror::Error)]
pub enum UncertaintyError {
    #[error("Expected a non-negative tag distance, found {0} m")]
    NegativeDistance(f64),

    #[error("Expected a non-negative off-axis angle, found {0} rad")]
    NegativeOffAxisAngle(f64),
}
