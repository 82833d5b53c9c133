use colorpose_3d::distortion::DistortionModel;
use colorpose_3d::{CameraIntrinsics, GeometryError};
use serde::{Deserialize, Serialize};

/// Calibration of the depth camera as carried by the sensor middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfo {
    /// Optical frame of the camera.
    pub frame_id: String,
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Row-major 3x3 camera matrix.
    pub k: [f64; 9],
    /// Distortion model tag, e.g. `plumb_bob`.
    #[serde(default)]
    pub distortion_model: String,
    /// Distortion coefficients.
    #[serde(default)]
    pub d: Vec<f64>,
}

impl CameraInfo {
    /// Build the camera intrinsics from this message.
    ///
    /// When `distortion_override` is set the model tag is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnknownDistortionModel`] for an unsupported tag and
    /// [`GeometryError::InvalidIntrinsics`] for an unusable camera matrix.
    pub fn to_intrinsics(
        &self,
        distortion_override: Option<DistortionModel>,
    ) -> Result<CameraIntrinsics, GeometryError> {
        let model = match distortion_override {
            Some(model) => model,
            None => self.distortion_model.parse()?,
        };
        CameraIntrinsics::from_camera_matrix(self.width, self.height, &self.k, model, &self.d)
    }
}
