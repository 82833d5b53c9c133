use glam::DVec3;

use crate::bbox::OrientedBoundingBox;
use crate::error::GeometryError;

/// A point cloud with points and optional per-point colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The colors of the points, aligned with `points`.
    colors: Option<Vec<[u8; 3]>>,
}

impl PointCloud {
    /// Create a new point cloud from points and optional colors.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Fusion`] if the number of colors differs from the number of points.
    pub fn new(points: Vec<[f64; 3]>, colors: Option<Vec<[u8; 3]>>) -> Result<Self, GeometryError> {
        if let Some(colors) = &colors {
            if colors.len() != points.len() {
                return Err(GeometryError::Fusion(format!(
                    "{} colors for {} points",
                    colors.len(),
                    points.len()
                )));
            }
        }
        Ok(Self { points, colors })
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> Option<&[[u8; 3]]> {
        self.colors.as_deref()
    }

    /// Return the points that lie inside the box, with their colors.
    ///
    /// The box is not modified. An empty result is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::MalformedBox`] if the box has non-finite or negative components.
    pub fn crop(&self, obb: &OrientedBoundingBox) -> Result<PointCloud, GeometryError> {
        obb.validate()?;

        let inside = self
            .points
            .iter()
            .map(|p| obb.contains(DVec3::from_array(*p)))
            .collect::<Vec<_>>();

        let points = self
            .points
            .iter()
            .zip(&inside)
            .filter_map(|(p, keep)| keep.then_some(*p))
            .collect();

        let colors = self.colors.as_ref().map(|colors| {
            colors
                .iter()
                .zip(&inside)
                .filter_map(|(c, keep)| keep.then_some(*c))
                .collect()
        });

        Ok(PointCloud { points, colors })
    }

    /// Trim the point cloud to the points inside the box.
    ///
    /// Returns the number of points removed. On error the cloud is left untouched.
    pub fn crop_in_place(&mut self, obb: &OrientedBoundingBox) -> Result<usize, GeometryError> {
        let before = self.len();
        *self = self.crop(obb)?;
        Ok(before - self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DMat3;

    fn grid_cloud() -> Result<PointCloud, GeometryError> {
        let mut points = Vec::new();
        let mut colors = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                points.push([i as f64 * 0.1, j as f64 * 0.1, 1.0]);
                colors.push([i as u8, j as u8, 0]);
            }
        }
        PointCloud::new(points, Some(colors))
    }

    #[test]
    fn test_pointcloud() -> Result<(), GeometryError> {
        let pointcloud = PointCloud::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
            Some(vec![[255, 0, 0], [0, 255, 0]]),
        )?;

        assert_eq!(pointcloud.len(), 2);
        assert_eq!(pointcloud.points().len(), 2);
        assert_eq!(pointcloud.colors().map(|c| c.len()), Some(2));

        Ok(())
    }

    #[test]
    fn test_mismatched_colors() {
        let res = PointCloud::new(vec![[0.0; 3]; 3], Some(vec![[0; 3]; 2]));
        assert!(matches!(res, Err(GeometryError::Fusion(_))));
    }

    #[test]
    fn test_crop() -> Result<(), GeometryError> {
        let cloud = grid_cloud()?;
        let obb = OrientedBoundingBox::new(
            DVec3::new(0.45, 0.45, 1.0),
            DMat3::IDENTITY,
            DVec3::new(0.2, 0.2, 0.4),
        );
        let cropped = cloud.crop(&obb)?;

        // 0.4 and 0.5 on both axes
        assert_eq!(cropped.len(), 4);
        assert!(cropped.points().iter().all(|p| obb.contains(DVec3::from_array(*p))));
        assert_eq!(cropped.colors().map(|c| c.to_vec()), Some(vec![[4, 4, 0], [4, 5, 0], [5, 4, 0], [5, 5, 0]]));

        // the source is unchanged
        assert_eq!(cloud.len(), 100);
        Ok(())
    }

    #[test]
    fn test_crop_empty_result() -> Result<(), GeometryError> {
        let cloud = grid_cloud()?;
        let p = DVec3::new(0.45, 0.45, 1.0);
        let obb = OrientedBoundingBox::from_center_corner(p, p, 3.0, 0.4);
        assert!(cloud.crop(&obb)?.is_empty());

        let empty = PointCloud::default();
        assert!(empty.crop(&obb)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_crop_in_place() -> Result<(), GeometryError> {
        let mut cloud = grid_cloud()?;
        let obb = OrientedBoundingBox::new(
            DVec3::new(0.0, 0.0, 1.0),
            DMat3::IDENTITY,
            DVec3::new(0.25, 0.25, 0.1),
        );
        let removed = cloud.crop_in_place(&obb)?;
        assert_eq!(removed, 96);
        assert_eq!(cloud.len(), 4);
        Ok(())
    }

    #[test]
    fn test_crop_malformed_box_keeps_cloud() -> Result<(), GeometryError> {
        let mut cloud = grid_cloud()?;
        let obb = OrientedBoundingBox::new(
            DVec3::new(0.0, f64::INFINITY, 1.0),
            DMat3::IDENTITY,
            DVec3::ONE,
        );
        assert!(matches!(cloud.crop_in_place(&obb), Err(GeometryError::MalformedBox(_))));
        assert_eq!(cloud.len(), 100);
        Ok(())
    }
}
