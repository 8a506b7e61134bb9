//! Covariance inflation
//!
//! Plain inverse-variance weighting collapses when the same correlated
//! information is fused again and again. Adding a fraction of the operands'
//! disagreement keeps the estimate honest when they conflict, and the floor
//! keeps it from converging to zero variance when they agree.

use super::Weights;
use crate::uncertainty::UncertainScalar;

/// Fraction of the dispersion added to the fused variance.
pub const DISPERSION_WEIGHT: f64 = 0.02;

/// Smallest variance this strategy will report.
pub const MIN_VARIANCE: f64 = 0.000009;

pub(super) fn fuse(a: &UncertainScalar, b: &UncertainScalar, w: &Weights) -> UncertainScalar {
    let mean = w.mean(a, b);
    let variance = 1.0 / w.total + DISPERSION_WEIGHT * w.dispersion(a, b, mean);
    UncertainScalar::from_variance(mean, variance.max(MIN_VARIANCE))
}
