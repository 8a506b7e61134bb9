//! Gaussian mixture
//!
//! Variance of an equal-weight two-component mixture, with the components
//! weighted by inverse variance for the mean. Fusing a variable with itself
//! leaves it unchanged.

use super::Weights;
use crate::uncertainty::UncertainScalar;

pub(super) fn fuse(a: &UncertainScalar, b: &UncertainScalar, w: &Weights) -> UncertainScalar {
    let mean = w.mean(a, b);
    let variance = 2.0 / w.total + w.dispersion(a, b, mean);
    UncertainScalar::from_variance(mean, variance)
}
