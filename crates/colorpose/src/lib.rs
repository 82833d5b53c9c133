#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Camera calibration messages.
pub mod camera_info;

/// Box and holder labelling.
pub mod classifier;

/// Object colors and detected regions.
pub mod color;

/// Estimator configuration.
pub mod config;

/// Color region detector interface.
pub mod detector;

/// Error types for the pipeline.
pub mod error;

/// Per-frame pipeline orchestration.
pub mod estimator;

/// Outbound pose interface.
pub mod publisher;

/// Pose records.
pub mod records;

/// Approximate time synchronization of the input streams.
pub mod sync;

pub use crate::camera_info::CameraInfo;
pub use crate::classifier::{classify, ObjectLabel, ObjectRole};
pub use crate::color::{ObjectColor, PixelRegion};
pub use crate::config::EstimatorConfig;
pub use crate::detector::{ColorRegionDetector, Detections, StaticDetector};
pub use crate::error::{ConfigError, DetectorError, PipelineError, PublishError, RegionError};
pub use crate::estimator::{ColorPoseEstimator, EstimatorState, FrameReport, RegionReport};
pub use crate::publisher::{CollectingPublisher, JsonLinesPublisher, PosePublisher};
pub use crate::records::{ColorPoseRecord, ColorPoseRecordSet};
pub use crate::sync::{ApproximateTimeSynchronizer, FrameTriple};

#[doc(inline)]
pub use colorpose_3d as geometry;

#[doc(inline)]
pub use colorpose_image as image;

#[doc(inline)]
pub use colorpose_tf as tf;
