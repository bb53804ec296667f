//! [`FrameTransform`] – fixed rotation between master and slave frames.
//!
//! The master manipulator and the slave tool do not share a coordinate
//! convention.  A single constant rotation R relates them: translation deltas
//! map as `R * Δ`, orientations as `R * M_rot`.  The transform is pure and
//! stateless; it is built once from configuration and applied every cycle.
//!
//! The reference mapping of the source system is `diag(-1, -1, 1)`: a 180°
//! rotation about Z that negates X and Y, available as
//! [`FrameTransform::mirror_xy`].
//!
//! # Example
//!
//! ```rust
//! use mimic_control::frame::FrameTransform;
//! use nalgebra::Vector3;
//!
//! let frame = FrameTransform::mirror_xy();
//! let mapped = frame.apply_vector(&Vector3::new(1.0, 2.0, 3.0));
//!
//! assert!((mapped.x - (-1.0)).abs() < 1e-12);
//! assert!((mapped.y - (-2.0)).abs() < 1e-12);
//! assert!((mapped.z - 3.0).abs() < 1e-12);
//! ```

use mimic_types::MimicError;
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// How far `R * R^T` and `det(R)` may deviate before a matrix is rejected.
const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

/// A fixed rotation from the master control frame to the slave tool frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    rotation: UnitQuaternion<f64>,
}

impl FrameTransform {
    /// The identity mapping: master and slave share one frame.
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Build a transform from an already-valid rotation.
    pub fn from_rotation(rotation: UnitQuaternion<f64>) -> Self {
        Self { rotation }
    }

    /// The reference master→slave mapping: 180° about Z, negating X and Y.
    pub fn mirror_xy() -> Self {
        Self {
            rotation: UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::PI),
        }
    }

    /// Build a transform from a raw 3×3 rotation matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MimicError::InvalidConfig`] if the matrix is not orthonormal
    /// or its determinant is not +1 (scaled, sheared, and mirrored matrices
    /// are all rejected rather than silently repaired).
    pub fn from_matrix(matrix: &Matrix3<f64>) -> Result<Self, MimicError> {
        let gram_error = (matrix * matrix.transpose() - Matrix3::identity()).norm();
        if !gram_error.is_finite() || gram_error > ORTHONORMAL_TOLERANCE {
            return Err(MimicError::InvalidConfig(format!(
                "frame matrix is not orthonormal (|R*R^T - I| = {gram_error:.3e})"
            )));
        }

        let det = matrix.determinant();
        if (det - 1.0).abs() > ORTHONORMAL_TOLERANCE {
            return Err(MimicError::InvalidConfig(format!(
                "frame matrix determinant is {det:.6}, expected +1"
            )));
        }

        let rotation = Rotation3::from_matrix_unchecked(*matrix);
        Ok(Self {
            rotation: UnitQuaternion::from_rotation_matrix(&rotation),
        })
    }

    /// The underlying rotation.
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        self.rotation
    }

    /// Map a master-frame displacement into the slave frame.
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * v
    }

    /// Map a master-frame orientation into the slave frame.
    ///
    /// The result is composed as `R * rotation` and explicitly re-normalized
    /// so commanded orientations never drift off SO(3).
    pub fn apply_rotation(&self, rotation: &UnitQuaternion<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::new_normalize((self.rotation * rotation).into_inner())
    }
}
