use colorpose_3d::GeometryError;
use colorpose_tf::TransformError;

/// Errors that abort the processing of a whole frame.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The camera calibration is unusable.
    #[error("Invalid camera calibration: {0}")]
    InvalidIntrinsics(#[source] GeometryError),

    /// Color and depth could not be combined into a point cloud.
    #[error("Color and depth fusion failed: {0}")]
    FusionFailure(#[source] GeometryError),

    /// The fused point cloud has no points.
    #[error("Scene cloud is empty, nothing to localize")]
    EmptySceneCloud,

    /// The region detector failed.
    #[error(transparent)]
    Detector(#[from] DetectorError),

    /// Results could not be handed to the outbound interface.
    #[error(transparent)]
    Publish(#[from] PublishError),

    /// Processing was abandoned because of a shutdown request.
    #[error("Frame processing cancelled after {published} published records")]
    Cancelled {
        /// Records already published for this frame.
        published: usize,
    },
}

/// Errors that skip a single detected region.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// No usable depth at a sampled pixel, including pixels outside the image.
    #[error("No valid depth at pixel ({x}, {y}), sampled {depth:?}")]
    InvalidDepth {
        /// Pixel column.
        x: i64,
        /// Pixel row.
        y: i64,
        /// The rejected depth in meters, `None` outside the image.
        depth: Option<f64>,
    },

    /// The camera to world transform was unavailable.
    #[error(transparent)]
    Transform(#[from] TransformError),
}

/// An error type for region detectors.
#[derive(thiserror::Error, Debug)]
pub enum DetectorError {
    /// The detector could not process the image.
    #[error("Detection failed: {0}")]
    Failed(String),
}

/// An error type for the outbound pose interface.
#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    /// Failed to write the message.
    #[error("Failed to write message. {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the message.
    #[error("Failed to serialize message. {0}")]
    Serialize(#[from] serde_json::Error),
}

/// An error type for loading the configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Error reading the file.
    #[error("Failed to read the configuration file. {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing the file.
    #[error("Failed to parse the configuration. {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its valid range.
    #[error("Invalid configuration value for '{0}': {1}")]
    InvalidValue(&'static str, String),
}
