#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// In-memory transform buffer.
pub mod buffer;

/// Cooperative cancellation.
pub mod cancel;

/// Error types for the transform module.
pub mod error;

/// Poses and timestamps.
pub mod pose;

/// The transform service interface.
pub mod service;

/// Camera to world frame transformer.
pub mod transformer;

pub use crate::buffer::StaticTransformBuffer;
pub use crate::cancel::CancellationToken;
pub use crate::error::TransformError;
pub use crate::pose::{Pose, Timestamp};
pub use crate::service::TransformService;
pub use crate::transformer::FrameTransformer;
