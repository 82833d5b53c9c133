/// An error type for the geometry module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Depth sample is zero, negative, non-finite or out of the sensor range.
    #[error("Invalid depth value: {0}")]
    InvalidDepth(f64),

    /// Camera calibration violates the intrinsics invariants.
    #[error("Invalid camera intrinsics: {0}")]
    InvalidIntrinsics(String),

    /// Rigid transform with a degenerate rotation or non-finite translation.
    #[error("Invalid transform: {0}")]
    InvalidTransform(String),

    /// Distortion tag not supported by any of the available models.
    #[error("Unknown distortion model: {0}")]
    UnknownDistortionModel(String),

    /// Bounding box with non-finite or negative components.
    #[error("Malformed bounding box: {0}")]
    MalformedBox(String),

    /// Color and depth could not be combined.
    #[error("Failed to fuse color and depth: {0}")]
    Fusion(String),

    /// Error coming from the image containers.
    #[error(transparent)]
    Image(#[from] colorpose_image::ImageError),
}
