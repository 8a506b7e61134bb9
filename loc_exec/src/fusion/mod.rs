//! # Fusion
//!
//! Two-operand combiners for uncertain scalars. All strategies share the same
//! mean (the inverse-variance weighted mean) and the same handling of exact
//! operands, and differ only in the variance they report.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod covariance_inflation;
mod gaussian_mixture;
mod inverse_variance;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Deserialize;

use crate::uncertainty::UncertainScalar;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Fusion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Fusor {
    /// Minimum-variance fusion of independent estimates. Repeated fusion of
    /// correlated estimates makes this overconfident.
    InverseVarianceWeighting,

    /// Product of Gaussians, identical in result to inverse-variance
    /// weighting.
    Bayesian,

    /// Inverse-variance weighting plus a small fraction of the operands'
    /// dispersion about the fused mean, with a variance floor.
    CovarianceInflation,

    /// Moment-matched equal mixture of the two operands.
    GaussianMixture,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Fusor {
    fn default() -> Self {
        Fusor::CovarianceInflation
    }
}

impl Fusor {
    /// Fuse two uncertain scalars.
    ///
    /// If either operand is crisp the result is crisp: two crisp operands
    /// meet at their midpoint, one crisp operand wins outright.
    pub fn fuse(&self, a: UncertainScalar, b: UncertainScalar) -> UncertainScalar {
        match (a.is_crisp(), b.is_crisp()) {
            (true, true) => return UncertainScalar::crisp((a.mean + b.mean) / 2.0),
            (true, false) => return UncertainScalar::crisp(a.mean),
            (false, true) => return UncertainScalar::crisp(b.mean),
            (false, false) => (),
        }

        let w = Weights::new(&a, &b);

        // Both operands unbounded, nothing to weight by
        if w.total == 0.0 {
            return UncertainScalar::from_variance(
                (a.mean + b.mean) / 2.0,
                a.variance.max(b.variance),
            );
        }

        match self {
            Fusor::InverseVarianceWeighting | Fusor::Bayesian => {
                inverse_variance::fuse(&a, &b, &w)
            }
            Fusor::CovarianceInflation => covariance_inflation::fuse(&a, &b, &w),
            Fusor::GaussianMixture => gaussian_mixture::fuse(&a, &b, &w),
        }
    }
}

/// Inverse-variance weights of a pair of operands.
pub(crate) struct Weights {
    pub a: f64,
    pub b: f64,
    pub total: f64,
}

impl Weights {
    fn new(a: &UncertainScalar, b: &UncertainScalar) -> Self {
        let wa = 1.0 / a.variance;
        let wb = 1.0 / b.variance;
        Self {
            a: wa,
            b: wb,
            total: wa + wb,
        }
    }

    /// The weighted mean.
    pub fn mean(&self, a: &UncertainScalar, b: &UncertainScalar) -> f64 {
        (self.a * a.mean + self.b * b.mean) / self.total
    }

    /// Weighted squared deviation of both operands about `mean`, normalised
    /// by the total weight.
    pub fn dispersion(&self, a: &UncertainScalar, b: &UncertainScalar, mean: f64) -> f64 {
        let da = a.mean - mean;
        let db = b.mean - mean;
        // An unbounded operand has zero weight and contributes nothing
        let term = |w: f64, d: f64| if w == 0.0 { 0.0 } else { w * d * d };
        (term(self.a, da) + term(self.b, db)) / self.total
    }
}
