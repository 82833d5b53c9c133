use std::sync::Arc;

use crate::distortion::{Distortion, DistortionModel};
use crate::error::GeometryError;

/// Intrinsic parameters of a pinhole camera with an optional lens distortion.
///
/// Built fresh from every calibration message and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct CameraIntrinsics {
    /// The image width in pixels
    pub width: u32,
    /// The image height in pixels
    pub height: u32,
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
    /// The raw distortion coefficients as received
    pub coeffs: Vec<f64>,
    distortion: Arc<dyn Distortion>,
}

impl CameraIntrinsics {
    /// Create the intrinsics of an undistorted pinhole camera.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidIntrinsics`] when the image is empty or a focal
    /// length is zero or non-finite.
    pub fn pinhole(
        width: u32,
        height: u32,
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
    ) -> Result<Self, GeometryError> {
        Self::with_distortion(width, height, [fx, fy, cx, cy], DistortionModel::None, &[])
    }

    /// Create the intrinsics with the given distortion model and coefficients.
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - The image size in pixels.
    /// * `focal_principal` - `[fx, fy, cx, cy]`.
    /// * `model` - The distortion model.
    /// * `coeffs` - The distortion coefficients in the model's order.
    pub fn with_distortion(
        width: u32,
        height: u32,
        focal_principal: [f64; 4],
        model: DistortionModel,
        coeffs: &[f64],
    ) -> Result<Self, GeometryError> {
        let [fx, fy, cx, cy] = focal_principal;

        if width == 0 || height == 0 {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "image size must be positive, got {width}x{height}"
            )));
        }
        if fx == 0.0 || fy == 0.0 || !fx.is_finite() || !fy.is_finite() {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "focal lengths must be finite and non-zero, got fx={fx} fy={fy}"
            )));
        }
        if !cx.is_finite() || !cy.is_finite() {
            return Err(GeometryError::InvalidIntrinsics(format!(
                "principal point must be finite, got cx={cx} cy={cy}"
            )));
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(GeometryError::InvalidIntrinsics(
                "distortion coefficients must be finite".to_string(),
            ));
        }

        Ok(Self {
            width,
            height,
            fx,
            fy,
            cx,
            cy,
            coeffs: coeffs.to_vec(),
            distortion: model.build(coeffs),
        })
    }

    /// Create the intrinsics from a row-major 3x3 camera matrix.
    ///
    /// fx, fy, cx and cy are read from positions 0, 4, 2 and 5.
    pub fn from_camera_matrix(
        width: u32,
        height: u32,
        k: &[f64; 9],
        model: DistortionModel,
        coeffs: &[f64],
    ) -> Result<Self, GeometryError> {
        Self::with_distortion(width, height, [k[0], k[4], k[2], k[5]], model, coeffs)
    }

    /// The distortion model applied by this camera.
    pub fn distortion(&self) -> &dyn Distortion {
        self.distortion.as_ref()
    }
}
