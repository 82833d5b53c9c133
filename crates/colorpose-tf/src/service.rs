use std::time::Duration;

use colorpose_3d::RigidTransform;

use crate::error::TransformError;
use crate::pose::Timestamp;

/// A time-indexed store of relationships between named coordinate frames.
///
/// Implementations may block up to `timeout` waiting for data to arrive.
pub trait TransformService: Send + Sync {
    /// Look up `target_T_source`, the transform mapping points expressed in
    /// `source_frame` into `target_frame`.
    ///
    /// `time` selects the sample to use; `None` asks for the most recent one.
    fn lookup(
        &self,
        source_frame: &str,
        target_frame: &str,
        time: Option<Timestamp>,
        timeout: Duration,
    ) -> Result<RigidTransform, TransformError>;
}
