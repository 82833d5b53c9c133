use glam::{DVec2, DVec3};

use crate::camera::CameraIntrinsics;
use crate::error::GeometryError;

/// Deproject a pixel with a metric depth into a 3D point in the camera optical frame.
///
/// The pixel is normalized with the pinhole model, the lens distortion is removed
/// and the ray is scaled so that `z == depth`.
///
/// # Arguments
///
/// * `pixel` - The pixel coordinate `(u, v)`.
/// * `depth` - The depth along the optical axis in meters.
/// * `intrinsics` - The camera intrinsics.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidDepth`] when the depth is not a positive finite number.
///
/// Example:
///
/// ```
/// use colorpose_3d::{deproject_pixel, CameraIntrinsics};
/// use glam::DVec2;
///
/// let intrinsics = CameraIntrinsics::pinhole(640, 480, 615.0, 615.0, 320.0, 240.0).unwrap();
/// let point = deproject_pixel(DVec2::new(320.0, 240.0), 1.5, &intrinsics).unwrap();
/// assert_eq!(point.to_array(), [0.0, 0.0, 1.5]);
/// ```
pub fn deproject_pixel(
    pixel: DVec2,
    depth: f64,
    intrinsics: &CameraIntrinsics,
) -> Result<DVec3, GeometryError> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(GeometryError::InvalidDepth(depth));
    }

    let x = (pixel.x - intrinsics.cx) / intrinsics.fx;
    let y = (pixel.y - intrinsics.cy) / intrinsics.fy;

    let distortion = intrinsics.distortion();
    let (x, y) = if distortion.is_identity() {
        (x, y)
    } else {
        distortion.undistort(x, y)
    };

    Ok(DVec3::new(x * depth, y * depth, depth))
}

/// Project a 3D point in the camera optical frame onto the image plane.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidDepth`] for points on or behind the camera plane.
pub fn project_point(point: DVec3, intrinsics: &CameraIntrinsics) -> Result<DVec2, GeometryError> {
    if !point.z.is_finite() || point.z <= 0.0 {
        return Err(GeometryError::InvalidDepth(point.z));
    }

    let x = point.x / point.z;
    let y = point.y / point.z;

    let distortion = intrinsics.distortion();
    let (x, y) = if distortion.is_identity() {
        (x, y)
    } else {
        distortion.distort(x, y)
    };

    Ok(DVec2::new(
        x * intrinsics.fx + intrinsics.cx,
        y * intrinsics.fy + intrinsics.cy,
    ))
}
