use colorpose_image::{ColorImage, DepthImage, Image, ImageSize};

use crate::camera::CameraIntrinsics;
use crate::error::GeometryError;
use crate::pointcloud::PointCloud;

/// A registered color and metric depth image pair.
#[derive(Debug, Clone)]
pub struct RgbdImage {
    /// The color image.
    pub color: ColorImage,
    /// The depth in meters; zero marks missing data.
    pub depth: Image<f32, 1>,
}

impl RgbdImage {
    /// Combine a color image with a raw depth image aligned to it.
    ///
    /// # Arguments
    ///
    /// * `color` - The color image.
    /// * `depth` - The raw depth image in sensor units.
    /// * `depth_scale` - Meters per sensor unit.
    /// * `depth_trunc` - Depths beyond this distance in meters are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Fusion`] when the images are empty or their sizes differ.
    pub fn from_color_and_depth(
        color: &ColorImage,
        depth: &DepthImage,
        depth_scale: f64,
        depth_trunc: f64,
    ) -> Result<Self, GeometryError> {
        if color.size() != depth.size() {
            return Err(GeometryError::Fusion(format!(
                "color {} and depth {} sizes differ",
                color.size(),
                depth.size()
            )));
        }
        if color.is_empty() {
            return Err(GeometryError::Fusion("empty images".to_string()));
        }
        if !(depth_scale.is_finite() && depth_scale > 0.0) {
            return Err(GeometryError::Fusion(format!(
                "depth scale must be positive, got {depth_scale}"
            )));
        }

        let metric = depth
            .as_slice()
            .iter()
            .map(|&raw| {
                let d = raw as f64 * depth_scale;
                if d > depth_trunc {
                    0.0
                } else {
                    d as f32
                }
            })
            .collect();

        Ok(Self {
            color: color.clone(),
            depth: Image::new(depth.size(), metric)?,
        })
    }

    /// Returns the dimensions of the image pair.
    pub fn size(&self) -> ImageSize {
        self.color.size()
    }
}

impl PointCloud {
    /// Back-project every pixel with valid depth into a colored point cloud.
    ///
    /// Uses the pinhole part of the intrinsics only, matching how dense scene clouds
    /// are produced from a registered RGB-D pair.
    pub fn from_rgbd(rgbd: &RgbdImage, intrinsics: &CameraIntrinsics) -> Result<Self, GeometryError> {
        let size = rgbd.size();
        if size.width != intrinsics.width as usize || size.height != intrinsics.height as usize {
            return Err(GeometryError::Fusion(format!(
                "image {} does not match the calibration {}x{}",
                size, intrinsics.width, intrinsics.height
            )));
        }

        let (fx, fy, cx, cy) = (intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy);
        let depth = rgbd.depth.as_slice();
        let color = rgbd.color.as_slice();

        let mut points = Vec::with_capacity(depth.len());
        let mut colors = Vec::with_capacity(depth.len());

        for (idx, &d) in depth.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            let (u, v) = ((idx % size.width) as f64, (idx / size.width) as f64);
            let z = d as f64;
            points.push([(u - cx) * z / fx, (v - cy) * z / fy, z]);
            colors.push([color[idx * 3], color[idx * 3 + 1], color[idx * 3 + 2]]);
        }

        log::debug!(
            "built scene cloud with {} points out of {} pixels",
            points.len(),
            depth.len()
        );

        PointCloud::new(points, Some(colors))
    }
}
