use std::sync::Arc;

use colorpose_3d::{
    deproject_pixel, CameraIntrinsics, OrientedBoundingBox, PointCloud, RgbdImage,
};
use colorpose_image::DepthImage;
use colorpose_tf::{CancellationToken, FrameTransformer, Timestamp, TransformError, TransformService};
use glam::{DVec2, DVec3};

use crate::classifier::{classify, ObjectLabel};
use crate::color::PixelRegion;
use crate::config::EstimatorConfig;
use crate::detector::ColorRegionDetector;
use crate::error::{ConfigError, PipelineError, RegionError};
use crate::publisher::PosePublisher;
use crate::records::{ColorPoseRecord, ColorPoseRecordSet};
use crate::sync::FrameTriple;

/// Where the estimator is in the processing of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimatorState {
    /// Idle, waiting for the next synchronized frame.
    WaitFrame,
    /// Localizing the detected regions.
    Processing,
    /// Handing the frame's records to the publisher.
    Publishing,
}

/// Outcome of one detected region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionReport {
    /// Label assigned to the region.
    pub label: String,
    /// The detected region.
    pub region: PixelRegion,
    /// Points of the scene cloud inside the region's box, `None` when the crop failed
    /// or the region was skipped before cropping.
    pub crop_points: Option<usize>,
    /// Why the region produced no record.
    pub error: Option<RegionError>,
}

/// Summary of a processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Stamp of the processed frame.
    pub stamp: Timestamp,
    /// Number of points in the scene cloud.
    pub scene_points: usize,
    /// Records published for the frame, in production order.
    pub records: Vec<ColorPoseRecord>,
    /// One entry per detected region.
    pub regions: Vec<RegionReport>,
}

impl FrameReport {
    /// Regions that produced no record.
    pub fn skipped(&self) -> impl Iterator<Item = &RegionReport> {
        self.regions.iter().filter(|r| r.error.is_some())
    }
}

// geometry of a localized region in the camera frame
struct Localized {
    position: DVec3,
    crop_points: Option<usize>,
}

/// Turns synchronized RGB-D frames into world poses of colored objects.
///
/// For every frame the color and depth images are fused into a scene cloud, the
/// detector is run on the color image and every detected rectangle is localized:
/// its center and top-left pixels are deprojected, a box is built around the
/// object and cropped from the scene, and the center is transformed into the world
/// frame. Each record is published as soon as it is known and the frame's records
/// are published together once all rectangles are done.
pub struct ColorPoseEstimator<D, P> {
    config: EstimatorConfig,
    detector: D,
    publisher: P,
    transformer: FrameTransformer,
    cancel: CancellationToken,
    state: EstimatorState,
}

impl<D, P> std::fmt::Debug for ColorPoseEstimator<D, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColorPoseEstimator")
            .field("config", &self.config)
            .field("transformer", &self.transformer)
            .field("state", &self.state)
            .finish()
    }
}

impl<D: ColorRegionDetector, P: PosePublisher> ColorPoseEstimator<D, P> {
    /// Create an estimator.
    ///
    /// # Arguments
    ///
    /// * `config` - The estimator configuration.
    /// * `detector` - Finds the colored regions in each color image.
    /// * `publisher` - Receives the records and the annotated images.
    /// * `transforms` - Provides the camera to world transform.
    ///
    /// # Errors
    ///
    /// Returns the first invalid configuration value.
    pub fn new(
        config: EstimatorConfig,
        detector: D,
        publisher: P,
        transforms: Arc<dyn TransformService>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let transformer = FrameTransformer::new(transforms, config.transform_timeout()?);
        Ok(Self {
            config,
            detector,
            publisher,
            transformer,
            cancel: CancellationToken::new(),
            state: EstimatorState::WaitFrame,
        })
    }

    /// Stop publishing once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.transformer = self.transformer.with_cancellation(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// The current state.
    pub fn state(&self) -> EstimatorState {
        self.state
    }

    /// The configuration in use.
    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Consume the estimator and return the publisher.
    pub fn into_publisher(self) -> P {
        self.publisher
    }

    /// Localize every detected object of one frame and publish the results.
    ///
    /// Regions without valid depth or without a world transform are skipped and
    /// reported in the returned [`FrameReport`]; the others are still published.
    ///
    /// # Errors
    ///
    /// Frame level failures publish nothing: an unusable calibration, images that
    /// cannot be fused, an empty scene cloud or a detector failure. On cancellation
    /// the records already published stand but the frame's record set is not sent.
    pub fn process_frame(&mut self, frame: &FrameTriple) -> Result<FrameReport, PipelineError> {
        self.state = EstimatorState::Processing;
        let result = self.process(frame);
        self.state = EstimatorState::WaitFrame;
        result
    }

    fn process(&mut self, frame: &FrameTriple) -> Result<FrameReport, PipelineError> {
        let intrinsics = frame
            .camera_info
            .to_intrinsics(self.config.distortion_override)
            .map_err(PipelineError::InvalidIntrinsics)?;

        let rgbd = RgbdImage::from_color_and_depth(
            &frame.color,
            &frame.depth,
            self.config.depth_scale,
            self.config.scene_depth_trunc,
        )
        .map_err(PipelineError::FusionFailure)?;

        let scene = PointCloud::from_rgbd(&rgbd, &intrinsics).map_err(PipelineError::FusionFailure)?;
        if scene.is_empty() {
            log::warn!("No valid depth in frame at {:.3}s", frame.stamp.as_secs_f64());
            return Err(PipelineError::EmptySceneCloud);
        }

        let detections = self.detector.detect(&frame.color)?;
        if let Err(err) = self.publisher.publish_debug_image(&detections.debug_image) {
            log::error!("Failed to publish the debug image: {err}");
        }

        let lookup_time = if self.config.lookup_latest {
            None
        } else {
            Some(frame.stamp)
        };

        let mut records = Vec::new();
        let mut regions = Vec::with_capacity(detections.num_regions());

        for (color, rects) in &detections.regions {
            for (label, region) in classify(*color, rects) {
                if self.cancel.is_cancelled() {
                    return Err(PipelineError::Cancelled {
                        published: records.len(),
                    });
                }

                let localized = match self.localize(region, &frame.depth, &intrinsics, &scene) {
                    Ok(localized) => localized,
                    Err(err) => {
                        log::warn!("Skipping {label}: {err}");
                        regions.push(RegionReport {
                            label: label.to_string(),
                            region: *region,
                            crop_points: None,
                            error: Some(err),
                        });
                        continue;
                    }
                };

                match self.to_world(label, localized.position, lookup_time) {
                    Ok(record) => {
                        // the record still joins the frame's set
                        if let Err(err) = self.publisher.publish_pose(&record) {
                            log::error!("Failed to publish {label}: {err}");
                        }
                        log::debug!("{} at {:?} in {}", record.label, record.position, record.frame_id);
                        records.push(record);
                        regions.push(RegionReport {
                            label: label.to_string(),
                            region: *region,
                            crop_points: localized.crop_points,
                            error: None,
                        });
                    }
                    Err(TransformError::Cancelled) => {
                        return Err(PipelineError::Cancelled {
                            published: records.len(),
                        });
                    }
                    Err(err) => {
                        log::error!("Failed to transform {label} into {}: {err}", self.config.world_frame);
                        regions.push(RegionReport {
                            label: label.to_string(),
                            region: *region,
                            crop_points: localized.crop_points,
                            error: Some(err.into()),
                        });
                    }
                }
            }
        }

        self.state = EstimatorState::Publishing;
        let set = ColorPoseRecordSet {
            frame_id: self.config.world_frame.clone(),
            stamp: frame.stamp,
            poses: records,
        };
        self.publisher.publish_pose_set(&set)?;

        log::info!(
            "Frame at {:.3}s: {} of {} regions localized, {} scene points",
            frame.stamp.as_secs_f64(),
            set.poses.len(),
            regions.len(),
            scene.len()
        );

        Ok(FrameReport {
            stamp: frame.stamp,
            scene_points: scene.len(),
            records: set.poses,
            regions,
        })
    }

    /// Deproject the region and crop its box from the scene.
    fn localize(
        &self,
        region: &PixelRegion,
        depth: &DepthImage,
        intrinsics: &CameraIntrinsics,
        scene: &PointCloud,
    ) -> Result<Localized, RegionError> {
        let center = self.deproject(region.center_pixel(), depth, intrinsics)?;
        let corner = self.deproject(region.top_left(), depth, intrinsics)?;

        let obb = OrientedBoundingBox::from_center_corner(
            center,
            corner,
            self.config.box_margin,
            self.config.box_depth_extent,
        );
        if obb.is_degenerate() {
            log::warn!("Degenerate box around {:?}, extent {:?}", center, obb.extent);
        }

        // the crop is informative only, a failure does not drop the region
        let crop_points = match scene.crop(&obb) {
            Ok(cropped) => {
                if cropped.is_empty() {
                    log::warn!("Box around {:?} contains no scene points", center);
                }
                Some(cropped.len())
            }
            Err(err) => {
                log::error!("Failed to crop the scene: {err}");
                None
            }
        };

        log::debug!(
            "region {:?}: center {:?} corner {:?} extent {:?}",
            (region.x, region.y, region.width, region.height),
            center,
            corner,
            obb.extent
        );

        Ok(Localized {
            position: center + DVec3::new(self.config.camera_x_correction, 0.0, 0.0),
            crop_points,
        })
    }

    fn deproject(
        &self,
        (x, y): (i64, i64),
        depth: &DepthImage,
        intrinsics: &CameraIntrinsics,
    ) -> Result<DVec3, RegionError> {
        if x < 0 || y < 0 || x >= depth.width() as i64 || y >= depth.height() as i64 {
            return Err(RegionError::InvalidDepth { x, y, depth: None });
        }
        let raw = depth
            .get_pixel(x as usize, y as usize, 0)
            .map_err(|_| RegionError::InvalidDepth { x, y, depth: None })?;

        let meters = raw as f64 * self.config.depth_scale;
        let invalid = RegionError::InvalidDepth {
            x,
            y,
            depth: Some(meters),
        };
        if meters > self.config.max_depth {
            return Err(invalid);
        }
        deproject_pixel(DVec2::new(x as f64, y as f64), meters, intrinsics).map_err(|_| invalid)
    }

    fn to_world(
        &self,
        label: ObjectLabel,
        position: DVec3,
        at: Option<Timestamp>,
    ) -> Result<ColorPoseRecord, TransformError> {
        let pose = self.transformer.transform_point(
            position,
            &self.config.camera_frame,
            &self.config.world_frame,
            at,
        )?;
        Ok(ColorPoseRecord {
            frame_id: self.config.world_frame.clone(),
            position: pose.position,
            orientation: pose.orientation,
            label: label.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_info::CameraInfo;
    use crate::color::ObjectColor;
    use crate::detector::StaticDetector;
    use crate::publisher::CollectingPublisher;
    use colorpose_3d::RigidTransform;
    use colorpose_image::{ColorImage, ImageSize};
    use colorpose_tf::StaticTransformBuffer;

    fn frame(width: usize, height: usize, raw_depth: u16) -> FrameTriple {
        let size = ImageSize::from([width, height]);
        FrameTriple {
            color: ColorImage::from_size_val(size, 128).unwrap(),
            depth: DepthImage::from_size_val(size, raw_depth).unwrap(),
            camera_info: CameraInfo {
                frame_id: "camera_depth_optical_frame".to_string(),
                width: width as u32,
                height: height as u32,
                k: [50.0, 0.0, 32.0, 0.0, 50.0, 24.0, 0.0, 0.0, 1.0],
                distortion_model: "plumb_bob".to_string(),
                d: vec![0.0; 5],
            },
            stamp: Timestamp::from_secs_f64(1.0),
        }
    }

    fn estimator(
        regions: Vec<PixelRegion>,
    ) -> ColorPoseEstimator<StaticDetector, CollectingPublisher> {
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform("world", "camera_depth_optical_frame", RigidTransform::IDENTITY);
        let config = EstimatorConfig {
            transform_timeout_secs: 0.05,
            ..Default::default()
        };
        ColorPoseEstimator::new(
            config,
            StaticDetector::from_regions(regions),
            CollectingPublisher::default(),
            Arc::new(buffer),
        )
        .expect("valid config")
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        for timeout in [-1.0, f64::NAN, 1e30] {
            let config = EstimatorConfig {
                transform_timeout_secs: timeout,
                ..Default::default()
            };
            let res = ColorPoseEstimator::new(
                config,
                StaticDetector::default(),
                CollectingPublisher::default(),
                Arc::new(StaticTransformBuffer::default()),
            );
            assert!(matches!(
                res,
                Err(ConfigError::InvalidValue("transform_timeout_secs", _))
            ));
        }
    }

    #[test]
    fn test_state_returns_to_wait_frame() -> Result<(), PipelineError> {
        let mut estimator = estimator(vec![PixelRegion::new(ObjectColor::Green, [10, 10, 8, 8])]);
        assert_eq!(estimator.state(), EstimatorState::WaitFrame);
        let report = estimator.process_frame(&frame(64, 48, 1000))?;
        assert_eq!(estimator.state(), EstimatorState::WaitFrame);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].label, "green_box");
        assert_eq!(report.scene_points, 64 * 48);
        assert!(report.regions[0].crop_points.is_some_and(|n| n > 0));
        assert_eq!(estimator.publisher().debug_images.len(), 1);
        Ok(())
    }

    #[test]
    fn test_region_outside_image_skipped() -> Result<(), PipelineError> {
        let mut estimator = estimator(vec![
            PixelRegion::new(ObjectColor::Blue, [100, 100, 10, 10]),
            PixelRegion::new(ObjectColor::Blue, [4, 4, 6, 6]),
        ]);
        let report = estimator.process_frame(&frame(64, 48, 1000))?;
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].label, "blue_holder");
        let skipped = report.skipped().collect::<Vec<_>>();
        assert_eq!(skipped.len(), 1);
        assert_eq!(
            skipped[0].error,
            Some(RegionError::InvalidDepth {
                x: 105,
                y: 105,
                depth: None
            })
        );
        Ok(())
    }

    #[test]
    fn test_depth_beyond_max_range_skipped() -> Result<(), PipelineError> {
        let mut estimator = estimator(vec![PixelRegion::new(ObjectColor::Red, [10, 10, 8, 8])]);
        estimator.config.max_depth = 0.5;
        let report = estimator.process_frame(&frame(64, 48, 1000))?;
        assert!(report.records.is_empty());
        assert!(matches!(
            report.regions[0].error,
            Some(RegionError::InvalidDepth { depth: Some(_), .. })
        ));
        // the empty set is still published
        assert_eq!(estimator.publisher().pose_sets.len(), 1);
        Ok(())
    }

    #[test]
    fn test_size_mismatch_is_fusion_failure() {
        let mut estimator = estimator(vec![]);
        let mut frame = frame(64, 48, 1000);
        frame.depth = DepthImage::from_size_val(ImageSize::from([32, 24]), 1000).unwrap();
        let res = estimator.process_frame(&frame);
        assert!(matches!(res, Err(PipelineError::FusionFailure(_))));
        assert!(estimator.publisher().pose_sets.is_empty());
        assert!(estimator.publisher().debug_images.is_empty());
    }

    #[test]
    fn test_invalid_calibration() {
        let mut estimator = estimator(vec![]);
        let mut frame = frame(64, 48, 1000);
        frame.camera_info.k[4] = 0.0;
        let res = estimator.process_frame(&frame);
        assert!(matches!(res, Err(PipelineError::InvalidIntrinsics(_))));
    }
}
