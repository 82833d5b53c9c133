use std::sync::Arc;
use std::time::Duration;

use glam::DVec3;

use crate::cancel::CancellationToken;
use crate::error::TransformError;
use crate::pose::{Pose, Timestamp};
use crate::service::TransformService;

/// Expresses camera-frame points as poses in another frame.
///
/// Only positions are transformed. Every produced pose carries the identity
/// orientation since no object orientation is estimated.
#[derive(Clone)]
pub struct FrameTransformer {
    service: Arc<dyn TransformService>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl std::fmt::Debug for FrameTransformer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameTransformer")
            .field("timeout", &self.timeout)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl FrameTransformer {
    /// Create a transformer querying `service`, waiting at most `timeout` per query.
    pub fn new(service: Arc<dyn TransformService>, timeout: Duration) -> Self {
        Self {
            service,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Discard results of queries that complete after `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Transform a point from `source_frame` into `target_frame`.
    ///
    /// `at` selects the transform sample; `None` uses the most recent one.
    ///
    /// # Errors
    ///
    /// Returns the service failure, [`TransformError::ApplyFailure`] when the result is
    /// not finite, or [`TransformError::Cancelled`] when a shutdown was requested before
    /// or during the query.
    pub fn transform_point(
        &self,
        point: DVec3,
        source_frame: &str,
        target_frame: &str,
        at: Option<Timestamp>,
    ) -> Result<Pose, TransformError> {
        if self.cancel.is_cancelled() {
            return Err(TransformError::Cancelled);
        }

        let result = self
            .service
            .lookup(source_frame, target_frame, at, self.timeout);

        // a lookup that returns after shutdown must not be published
        if self.cancel.is_cancelled() {
            return Err(TransformError::Cancelled);
        }

        let pose = Pose::from_position(result?.transform_point(point));
        if !pose.is_finite() {
            return Err(TransformError::ApplyFailure(format!(
                "non-finite position after transforming '{source_frame}' into '{target_frame}'"
            )));
        }
        Ok(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::StaticTransformBuffer;
    use approx::assert_relative_eq;
    use colorpose_3d::RigidTransform;
    use glam::DQuat;

    #[test]
    fn test_transform_point() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform(
            "world",
            "camera_depth_optical_frame",
            RigidTransform::from_translation(DVec3::new(1.0, 0.0, 0.5)),
        );
        let transformer = FrameTransformer::new(Arc::new(buffer), Duration::from_millis(50));
        let pose = transformer.transform_point(
            DVec3::new(0.1, 0.2, 1.0),
            "camera_depth_optical_frame",
            "world",
            None,
        )?;
        assert_relative_eq!(pose.position.x, 1.1);
        assert_relative_eq!(pose.position.y, 0.2);
        assert_relative_eq!(pose.position.z, 1.5);
        assert_eq!(pose.orientation, DQuat::IDENTITY);
        Ok(())
    }

    #[test]
    fn test_rotated_frame_keeps_identity_orientation() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform(
            "world",
            "camera",
            RigidTransform {
                rotation: DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2),
                translation: DVec3::ZERO,
            },
        );
        let transformer = FrameTransformer::new(Arc::new(buffer), Duration::from_millis(50));
        let pose = transformer.transform_point(DVec3::X, "camera", "world", None)?;
        assert_relative_eq!(pose.position.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(pose.position.y, 1.0, epsilon = 1e-12);
        assert_eq!(pose.orientation, DQuat::IDENTITY);
        Ok(())
    }

    #[test]
    fn test_non_finite_result_is_rejected() {
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform(
            "world",
            "camera",
            RigidTransform::from_translation(DVec3::new(f64::INFINITY, 0.0, 0.0)),
        );
        let transformer = FrameTransformer::new(Arc::new(buffer), Duration::from_millis(10));
        let res = transformer.transform_point(DVec3::ZERO, "camera", "world", None);
        assert!(matches!(res, Err(TransformError::ApplyFailure(_))));
    }

    #[test]
    fn test_lookup_failure_surfaces() {
        let transformer = FrameTransformer::new(
            Arc::new(StaticTransformBuffer::default()),
            Duration::from_millis(10),
        );
        let res = transformer.transform_point(DVec3::ZERO, "camera", "world", None);
        assert!(matches!(res, Err(TransformError::LookupFailure { .. })));
    }

    #[test]
    fn test_cancelled_transformer() {
        let cancel = CancellationToken::new();
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform("world", "camera", RigidTransform::IDENTITY);
        let transformer = FrameTransformer::new(Arc::new(buffer), Duration::from_millis(10))
            .with_cancellation(cancel.clone());
        cancel.cancel();
        let res = transformer.transform_point(DVec3::ZERO, "camera", "world", None);
        assert_eq!(res, Err(TransformError::Cancelled));
    }
}
