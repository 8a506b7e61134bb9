//! Forward and inverse kinematics of a swerve drive

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{DMatrix, DVector, Vector2};

use super::{KinematicsError, WheelDelta, WheelDeltas, NUM_MODULES};
use crate::geom::Twist2;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Geometries whose normal matrix has a smaller determinant are rejected.
const MIN_DETERMINANT: f64 = 1e-9;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Swerve drive geometry.
///
/// Each module contributes two rows to the system `A·[dx, dy, dtheta] = v`,
/// with `v` the module's displacement in the robot frame. The forward
/// kinematics is the least-squares solution through the pseudo-inverse of
/// `A`, which is computed once.
#[derive(Debug, Clone)]
pub struct SwerveKinematics {
    /// Units: meters,
    /// Frame: Robot body
    module_pos_m_rb: [Vector2<f64>; NUM_MODULES],

    /// 3 x (2 * NUM_MODULES)
    pinv: DMatrix<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SwerveKinematics {
    /// Build the kinematics for modules at the given robot-frame positions,
    /// ordered front-left, front-right, rear-left, rear-right.
    pub fn new(module_pos_m_rb: [[f64; 2]; NUM_MODULES]) -> Result<Self, KinematicsError> {
        let mut a = DMatrix::<f64>::zeros(2 * NUM_MODULES, 3);
        for (i, p) in module_pos_m_rb.iter().enumerate() {
            a[(2 * i, 0)] = 1.0;
            a[(2 * i, 2)] = -p[1];
            a[(2 * i + 1, 1)] = 1.0;
            a[(2 * i + 1, 2)] = p[0];
        }

        let at = a.transpose();
        let ata = &at * &a;
        if ata.determinant().abs() < MIN_DETERMINANT {
            return Err(KinematicsError::SingularGeometry(module_pos_m_rb));
        }
        let pinv = match ata.try_inverse() {
            Some(inv) => inv * at,
            None => return Err(KinematicsError::SingularGeometry(module_pos_m_rb)),
        };

        let mut pos = [Vector2::zeros(); NUM_MODULES];
        for (v, p) in pos.iter_mut().zip(module_pos_m_rb.iter()) {
            *v = Vector2::new(p[0], p[1]);
        }

        Ok(Self {
            module_pos_m_rb: pos,
            pinv,
        })
    }

    /// A square drive base with the modules `track_m` apart.
    pub fn square(track_m: f64) -> Result<Self, KinematicsError> {
        let h = track_m / 2.0;
        Self::new([[h, h], [h, -h], [-h, h], [-h, -h]])
    }

    /// Forward kinematics: the robot-frame twist which best explains the
    /// module motions.
    ///
    /// A module without an angle contributes no motion.
    pub fn to_twist(&self, deltas: &WheelDeltas) -> Twist2 {
        let mut v = [0f64; 2 * NUM_MODULES];
        for (i, d) in deltas.0.iter().enumerate() {
            if let Some(angle) = d.angle_rad {
                v[2 * i] = d.distance_m * angle.cos();
                v[2 * i + 1] = d.distance_m * angle.sin();
            }
        }

        let t = &self.pinv * DVector::from_row_slice(&v);

        Twist2::new(t[0], t[1], t[2])
    }

    /// Inverse kinematics: the module motions which produce `twist`.
    ///
    /// Angles are in `[-pi, pi]`, and a module which doesn't move keeps the
    /// angle from `previous_angles_rad`. Callers that need continuous angles
    /// should unwrap them.
    pub fn to_deltas(
        &self,
        twist: &Twist2,
        previous_angles_rad: &[f64; NUM_MODULES]
    ) -> WheelDeltas {
        let mut deltas = [WheelDelta::default(); NUM_MODULES];
        for (i, d) in deltas.iter_mut().enumerate() {
            let p = self.module_pos_m_rb[i];
            let vx = twist.dx_m - twist.dtheta_rad * p.y;
            let vy = twist.dy_m + twist.dtheta_rad * p.x;
            let distance_m = vx.hypot(vy);

            *d = WheelDelta {
                distance_m,
                angle_rad: if distance_m > 0.0 {
                    Some(vy.atan2(vx))
                }
                else {
                    Some(previous_angles_rad[i])
                },
            };
        }
        WheelDeltas(deltas)
    }
}
