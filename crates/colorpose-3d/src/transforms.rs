use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// A rigid body transform: rotation followed by translation.
///
/// `target_T_source` maps a point expressed in the source frame into the target frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// Rotation as a unit quaternion.
    pub rotation: DQuat,
    /// Translation in meters.
    pub translation: DVec3,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    /// The identity transform.
    pub const IDENTITY: Self = Self {
        rotation: DQuat::IDENTITY,
        translation: DVec3::ZERO,
    };

    /// Create a transform from a rotation and a translation.
    ///
    /// The quaternion is normalized; a zero quaternion is rejected.
    pub fn new(rotation: DQuat, translation: DVec3) -> Result<Self, GeometryError> {
        let norm = rotation.length();
        if !norm.is_finite() || norm < 1e-10 || !translation.is_finite() {
            return Err(GeometryError::InvalidTransform(format!(
                "invalid rigid transform: rotation {rotation}, translation {translation}"
            )));
        }
        Ok(Self {
            rotation: rotation / norm,
            translation,
        })
    }

    /// Create a pure translation.
    pub fn from_translation(translation: DVec3) -> Self {
        Self {
            rotation: DQuat::IDENTITY,
            translation,
        }
    }

    /// Create a transform from an axis, an angle and a translation.
    ///
    /// # Errors
    ///
    /// The axis must not be the zero vector.
    ///
    /// Example:
    ///
    /// ```
    /// use colorpose_3d::RigidTransform;
    /// use glam::DVec3;
    ///
    /// let tf = RigidTransform::from_axis_angle(DVec3::Z, std::f64::consts::FRAC_PI_2, DVec3::ZERO).unwrap();
    /// let p = tf.transform_point(DVec3::X);
    /// assert!((p - DVec3::Y).length() < 1e-12);
    /// ```
    pub fn from_axis_angle(
        axis: DVec3,
        angle: f64,
        translation: DVec3,
    ) -> Result<Self, GeometryError> {
        let magnitude = axis.length();
        if magnitude < 1e-10 {
            return Err(GeometryError::InvalidTransform(
                "cannot compute rotation from a zero axis".to_string(),
            ));
        }
        Self::new(DQuat::from_axis_angle(axis / magnitude, angle), translation)
    }

    /// Invert the transform.
    pub fn inverse(&self) -> RigidTransform {
        let rotation = self.rotation.conjugate();
        RigidTransform {
            rotation,
            translation: -(rotation * self.translation),
        }
    }

    /// Apply the transform to a point.
    #[inline]
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.rotation * point + self.translation
    }
}
