//! Inverse-variance weighting

use super::Weights;
use crate::uncertainty::UncertainScalar;

pub(super) fn fuse(a: &UncertainScalar, b: &UncertainScalar, w: &Weights) -> UncertainScalar {
    UncertainScalar::from_variance(w.mean(a, b), 1.0 / w.total)
}
