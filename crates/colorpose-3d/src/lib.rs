#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Oriented bounding boxes.
pub mod bbox;

/// Pinhole camera intrinsics.
pub mod camera;

/// Lens distortion models.
pub mod distortion;

/// Error types for the geometry module.
pub mod error;

/// Point cloud container and cropping.
pub mod pointcloud;

/// Pixel to point deprojection and its inverse.
pub mod projection;

/// Color and depth fusion.
pub mod rgbd;

/// 3D rigid transforms.
pub mod transforms;

pub use crate::bbox::OrientedBoundingBox;
pub use crate::camera::CameraIntrinsics;
pub use crate::error::GeometryError;
pub use crate::pointcloud::PointCloud;
pub use crate::projection::{deproject_pixel, project_point};
pub use crate::rgbd::RgbdImage;
pub use crate::transforms::RigidTransform;
