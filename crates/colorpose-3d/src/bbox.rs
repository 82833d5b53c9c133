use glam::{DMat3, DVec3};

use crate::error::GeometryError;

/// Margin applied to the center-to-corner offset when sizing a box.
pub const DEFAULT_BOX_MARGIN: f64 = 3.0;

/// Extent of the box along the optical axis, in meters.
pub const DEFAULT_DEPTH_EXTENT: f64 = 0.4;

/// A 3D box defined by its center, orientation and full side lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBoundingBox {
    /// Center of the box.
    pub center: DVec3,
    /// Rotation from the box axes to the frame of `center`.
    pub rotation: DMat3,
    /// Full side lengths along the box axes.
    pub extent: DVec3,
}

impl OrientedBoundingBox {
    /// Create a new box.
    pub fn new(center: DVec3, rotation: DMat3, extent: DVec3) -> Self {
        Self {
            center,
            rotation,
            extent,
        }
    }

    /// Build a camera-facing box around an object from its center and one corner.
    ///
    /// The in-plane extents are `margin` times the absolute center to corner offset on
    /// each of the x and y axes; the extent along the optical axis is fixed. The box
    /// is axis aligned in the camera frame.
    ///
    /// Example:
    ///
    /// ```
    /// use colorpose_3d::OrientedBoundingBox;
    /// use glam::DVec3;
    ///
    /// let center = DVec3::new(0.1, 0.2, 1.0);
    /// let corner = DVec3::new(0.05, 0.1, 1.0);
    /// let obb = OrientedBoundingBox::from_center_corner(center, corner, 3.0, 0.4);
    /// assert!((obb.extent.x - 0.15).abs() < 1e-12);
    /// assert!((obb.extent.y - 0.3).abs() < 1e-12);
    /// assert_eq!(obb.extent.z, 0.4);
    /// ```
    pub fn from_center_corner(center: DVec3, corner: DVec3, margin: f64, depth_extent: f64) -> Self {
        let offset = (center - corner).abs();
        Self {
            center,
            rotation: DMat3::IDENTITY,
            extent: DVec3::new(margin * offset.x, margin * offset.y, depth_extent),
        }
    }

    /// Check that every component is finite and the extents are non-negative.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !self.center.is_finite() {
            return Err(GeometryError::MalformedBox(format!(
                "center is not finite: {}",
                self.center
            )));
        }
        if !self.extent.is_finite() || self.extent.min_element() < 0.0 {
            return Err(GeometryError::MalformedBox(format!(
                "extent must be finite and non-negative: {}",
                self.extent
            )));
        }
        if !self.rotation.is_finite() {
            return Err(GeometryError::MalformedBox(
                "rotation is not finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether any in-plane side has collapsed to zero.
    pub fn is_degenerate(&self) -> bool {
        self.extent.x == 0.0 || self.extent.y == 0.0
    }

    /// Check if a point lies inside the box, boundary included.
    #[inline]
    pub fn contains(&self, point: DVec3) -> bool {
        let local = self.rotation.transpose() * (point - self.center);
        let half = self.extent * 0.5;
        local.abs().cmple(half).all()
    }
}
