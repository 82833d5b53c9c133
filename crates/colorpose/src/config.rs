use std::path::Path;
use std::time::Duration;

use colorpose_3d::bbox::{DEFAULT_BOX_MARGIN, DEFAULT_DEPTH_EXTENT};
use colorpose_3d::distortion::DistortionModel;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables of the color pose estimator.
///
/// Every field has a default matching the reference camera deployment, so a
/// configuration file only needs to list what differs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Optical frame of the depth camera.
    pub camera_frame: String,
    /// Frame the poses are published in.
    pub world_frame: String,
    /// Maximum wait for a transform lookup, in seconds.
    pub transform_timeout_secs: f64,
    /// Query the most recent transform instead of the one at the frame stamp.
    pub lookup_latest: bool,
    /// Meters per raw depth unit.
    pub depth_scale: f64,
    /// Depths beyond this distance are dropped from the scene cloud, in meters.
    pub scene_depth_trunc: f64,
    /// Sampled depths beyond this distance count as missing, in meters.
    pub max_depth: f64,
    /// Margin applied to the center to corner offset of each box.
    pub box_margin: f64,
    /// Box extent along the optical axis, in meters.
    pub box_depth_extent: f64,
    /// Offset added to the x coordinate of each center before transforming, in meters.
    pub camera_x_correction: f64,
    /// Distortion model forced on every calibration, ignoring its tag.
    pub distortion_override: Option<DistortionModel>,
    /// Messages kept per input stream by the synchronizer.
    pub sync_queue_size: usize,
    /// Largest stamp spread accepted by the synchronizer, in seconds.
    pub sync_slop: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            camera_frame: "camera_depth_optical_frame".to_string(),
            world_frame: "world".to_string(),
            transform_timeout_secs: 1.0,
            lookup_latest: true,
            depth_scale: 0.001,
            scene_depth_trunc: 3.0,
            max_depth: 10.0,
            box_margin: DEFAULT_BOX_MARGIN,
            box_depth_extent: DEFAULT_DEPTH_EXTENT,
            camera_x_correction: -0.015,
            distortion_override: Some(DistortionModel::BrownConrady),
            sync_queue_size: 10,
            sync_slop: 0.1,
        }
    }
}

impl EstimatorConfig {
    /// Read a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is within its valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(ConfigError::InvalidValue(name, format!("{value} is not positive")))
            }
        }

        positive("transform_timeout_secs", self.transform_timeout_secs)?;
        self.transform_timeout()?;
        positive("depth_scale", self.depth_scale)?;
        positive("scene_depth_trunc", self.scene_depth_trunc)?;
        positive("max_depth", self.max_depth)?;
        positive("box_margin", self.box_margin)?;
        positive("box_depth_extent", self.box_depth_extent)?;
        positive("sync_slop", self.sync_slop)?;

        if !self.camera_x_correction.is_finite() {
            return Err(ConfigError::InvalidValue(
                "camera_x_correction",
                "must be finite".to_string(),
            ));
        }
        if self.sync_queue_size == 0 {
            return Err(ConfigError::InvalidValue(
                "sync_queue_size",
                "must be at least 1".to_string(),
            ));
        }
        if self.camera_frame.is_empty() || self.world_frame.is_empty() {
            return Err(ConfigError::InvalidValue(
                "frame",
                "frame names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// The transform lookup timeout.
    pub fn transform_timeout(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.transform_timeout_secs)
            .map_err(|e| ConfigError::InvalidValue("transform_timeout_secs", e.to_string()))
    }
}
