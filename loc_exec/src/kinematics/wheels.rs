//! Wheel positions and deltas

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use util::maths::lerp;

use super::NUM_MODULES;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Accumulated state of a single swerve module.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelPosition {
    /// Total distance rolled by the wheel.
    ///
    /// Units: meters
    pub distance_m: f64,

    /// Unwrapped steering angle in the robot frame, or `None` if the encoder
    /// can't tell (for example just after power up).
    ///
    /// Units: radians
    pub angle_rad: Option<f64>,
}

/// Positions of all modules at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WheelPositions(pub [WheelPosition; NUM_MODULES]);

/// Motion of a single module between two samples: the distance rolled and
/// the steering angle at the end of the motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDelta {
    pub distance_m: f64,
    pub angle_rad: Option<f64>,
}

/// Motion of every module between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WheelDeltas(pub [WheelDelta; NUM_MODULES]);

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WheelPosition {
    pub fn new(distance_m: f64, angle_rad: Option<f64>) -> Self {
        Self { distance_m, angle_rad }
    }

    /// Interpolate towards `end`.
    ///
    /// The steering angle is interpolated only when both ends know it,
    /// otherwise whichever end knows it is used.
    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        let angle_rad = match (self.angle_rad, end.angle_rad) {
            (Some(a), Some(b)) => Some(lerp(a, b, t)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        };

        Self {
            distance_m: lerp(self.distance_m, end.distance_m, t),
            angle_rad,
        }
    }
}

impl WheelPositions {
    /// Every module at zero distance and zero angle.
    pub fn zero() -> Self {
        Self([WheelPosition::new(0.0, Some(0.0)); NUM_MODULES])
    }

    /// The motion from these positions to `end`, using `end`'s angles.
    pub fn delta_to(&self, end: &WheelPositions) -> WheelDeltas {
        let mut deltas = [WheelDelta::default(); NUM_MODULES];
        for (i, d) in deltas.iter_mut().enumerate() {
            *d = WheelDelta {
                distance_m: end.0[i].distance_m - self.0[i].distance_m,
                angle_rad: end.0[i].angle_rad,
            };
        }
        WheelDeltas(deltas)
    }

    /// Apply per-module motion to these positions.
    pub fn plus(&self, deltas: &WheelDeltas) -> WheelPositions {
        let mut out = *self;
        for (p, d) in out.0.iter_mut().zip(deltas.0.iter()) {
            p.distance_m += d.distance_m;
            if d.angle_rad.is_some() {
                p.angle_rad = d.angle_rad;
            }
        }
        out
    }

    pub fn interpolate(&self, end: &WheelPositions, t: f64) -> WheelPositions {
        let mut out = *self;
        for (p, e) in out.0.iter_mut().zip(end.0.iter()) {
            *p = p.interpolate(e, t);
        }
        out
    }
}
