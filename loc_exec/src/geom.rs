//! # Planar geometry
//!
//! Poses, twists and velocities in the field plane. Headings are kept in
//! `[-pi, pi)`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use util::maths::{get_ang_dist, wrap_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Below this rotation the pose exponential uses its Taylor expansion.
const SMALL_ANGLE_RAD: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position and heading of the robot centre in the field frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose2 {
    /// Units: meters,
    /// Frame: Field
    pub position_m: Vector2<f64>,

    /// Angle from the field x axis, counter-clockwise positive.
    ///
    /// Units: radians
    pub heading_rad: f64,
}

/// A motion along a constant-curvature arc, expressed in the robot frame at
/// the start of the arc.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Twist2 {
    pub dx_m: f64,
    pub dy_m: f64,
    pub dtheta_rad: f64,
}

/// Field-relative velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity2 {
    pub vx_ms: f64,
    pub vy_ms: f64,
    pub omega_rads: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    pub fn new(x_m: f64, y_m: f64, heading_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            heading_rad: wrap_pi(heading_rad),
        }
    }

    pub fn x_m(&self) -> f64 {
        self.position_m.x
    }

    pub fn y_m(&self) -> f64 {
        self.position_m.y
    }

    /// Rotation from the robot frame into the field frame.
    pub fn rotation(&self) -> Rotation2<f64> {
        Rotation2::new(self.heading_rad)
    }

    /// Straight-line distance between the two positions.
    pub fn distance_m(&self, other: &Pose2) -> f64 {
        (other.position_m - self.position_m).norm()
    }

    /// Signed shortest rotation from this heading to `other`'s.
    pub fn heading_error_rad(&self, other: &Pose2) -> f64 {
        get_ang_dist(self.heading_rad, other.heading_rad)
    }

    /// Apply a twist to this pose, following the arc it describes.
    pub fn exp(&self, twist: &Twist2) -> Pose2 {
        let dtheta = twist.dtheta_rad;
        let sin_theta = dtheta.sin();
        let cos_theta = dtheta.cos();

        let (s, c) = if dtheta.abs() < SMALL_ANGLE_RAD {
            (1.0 - dtheta * dtheta / 6.0, 0.5 * dtheta)
        }
        else {
            (sin_theta / dtheta, (1.0 - cos_theta) / dtheta)
        };

        let local = Vector2::new(
            twist.dx_m * s - twist.dy_m * c,
            twist.dx_m * c + twist.dy_m * s,
        );

        Pose2 {
            position_m: self.position_m + self.rotation() * local,
            heading_rad: wrap_pi(self.heading_rad + dtheta),
        }
    }
}

impl Twist2 {
    pub fn new(dx_m: f64, dy_m: f64, dtheta_rad: f64) -> Self {
        Self { dx_m, dy_m, dtheta_rad }
    }

    /// Translational length of the twist.
    ///
    /// Units: meters
    pub fn norm_m(&self) -> f64 {
        self.dx_m.hypot(self.dy_m)
    }

    /// Same twist with the rotation replaced.
    pub fn with_dtheta(&self, dtheta_rad: f64) -> Self {
        Self { dtheta_rad, ..*self }
    }
}

impl Velocity2 {
    /// Velocity from a robot-frame twist over `dt_s`, rotated into the field
    /// frame by `heading_rad`. Zero if no time has passed.
    pub fn from_twist(twist: &Twist2, heading_rad: f64, dt_s: f64) -> Self {
        if dt_s <= 0.0 {
            return Self::default();
        }

        let v = Rotation2::new(heading_rad) * Vector2::new(twist.dx_m, twist.dy_m) / dt_s;

        Self {
            vx_ms: v.x,
            vy_ms: v.y,
            omega_rads: twist.dtheta_rad / dt_s,
        }
    }

    pub fn interpolate(&self, end: &Self, t: f64) -> Self {
        Self {
            vx_ms: util::maths::lerp(self.vx_ms, end.vx_ms, t),
            vy_ms: util::maths::lerp(self.vy_ms, end.vy_ms, t),
            omega_rads: util::maths::lerp(self.omega_rads, end.omega_rads, t),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_exp_straight() {
        let p = Pose2::new(1.0, 2.0, FRAC_PI_2).exp(&Twist2::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(p.x_m(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y_m(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.heading_rad, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_exp_arc() {
        // Quarter circle of radius 1 to the left
        let p = Pose2::default().exp(&Twist2::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        assert_abs_diff_eq!(p.x_m(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.y_m(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p.heading_rad, FRAC_PI_2, epsilon = 1e-12);

        // Tiny rotations agree with the exact form
        let a = Pose2::default().exp(&Twist2::new(1.0, 0.5, 1e-10));
        assert_abs_diff_eq!(a.x_m(), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(a.y_m(), 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_heading_wrap() {
        let p = Pose2::new(0.0, 0.0, 3.0).exp(&Twist2::new(0.0, 0.0, 0.5));
        assert_abs_diff_eq!(p.heading_rad, 3.5 - 2.0 * PI, epsilon = 1e-12);
        assert_abs_diff_eq!(
            Pose2::new(0.0, 0.0, 3.0).heading_error_rad(&Pose2::new(0.0, 0.0, -3.0)),
            2.0 * PI - 6.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_velocity() {
        let v = Velocity2::from_twist(&Twist2::new(0.1, 0.0, 0.02), FRAC_PI_2, 0.02);
        assert_abs_diff_eq!(v.vx_ms, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.vy_ms, 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.omega_rads, 1.0, epsilon = 1e-12);
        assert_eq!(Velocity2::from_twist(&Twist2::new(1.0, 0.0, 0.0), 0.0, 0.0), Velocity2::default());
    }
}
