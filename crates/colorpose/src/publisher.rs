use std::io::Write;

use colorpose_image::ColorImage;
use serde::Serialize;

use crate::error::PublishError;
use crate::records::{ColorPoseRecord, ColorPoseRecordSet};

/// Sink for everything the estimator produces.
pub trait PosePublisher {
    /// Publish the record of a single object as soon as it is known.
    fn publish_pose(&mut self, record: &ColorPoseRecord) -> Result<(), PublishError>;

    /// Publish every record of a frame at once.
    fn publish_pose_set(&mut self, set: &ColorPoseRecordSet) -> Result<(), PublishError>;

    /// Publish the detector's annotated image.
    fn publish_debug_image(&mut self, image: &ColorImage) -> Result<(), PublishError>;
}

/// A publisher keeping everything in memory.
#[derive(Debug, Default, Clone)]
pub struct CollectingPublisher {
    /// Individual records, in publication order.
    pub poses: Vec<ColorPoseRecord>,
    /// Aggregate sets, one per completed frame.
    pub pose_sets: Vec<ColorPoseRecordSet>,
    /// Annotated images.
    pub debug_images: Vec<ColorImage>,
}

impl PosePublisher for CollectingPublisher {
    fn publish_pose(&mut self, record: &ColorPoseRecord) -> Result<(), PublishError> {
        self.poses.push(record.clone());
        Ok(())
    }

    fn publish_pose_set(&mut self, set: &ColorPoseRecordSet) -> Result<(), PublishError> {
        self.pose_sets.push(set.clone());
        Ok(())
    }

    fn publish_debug_image(&mut self, image: &ColorImage) -> Result<(), PublishError> {
        self.debug_images.push(image.clone());
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message<'a> {
    Pose(&'a ColorPoseRecord),
    PoseSet(&'a ColorPoseRecordSet),
    DebugImage { width: usize, height: usize },
}

/// A publisher writing one JSON object per line.
///
/// Debug images are reported by their size only.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    /// Create a publisher writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the publisher and return the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write(&mut self, message: &Message<'_>) -> Result<(), PublishError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl<W: Write> PosePublisher for JsonLinesPublisher<W> {
    fn publish_pose(&mut self, record: &ColorPoseRecord) -> Result<(), PublishError> {
        self.write(&Message::Pose(record))
    }

    fn publish_pose_set(&mut self, set: &ColorPoseRecordSet) -> Result<(), PublishError> {
        self.write(&Message::PoseSet(set))
    }

    fn publish_debug_image(&mut self, image: &ColorImage) -> Result<(), PublishError> {
        self.write(&Message::DebugImage {
            width: image.width(),
            height: image.height(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colorpose_image::ImageSize;
    use colorpose_tf::Timestamp;
    use glam::{DQuat, DVec3};

    fn record() -> ColorPoseRecord {
        ColorPoseRecord {
            frame_id: "world".to_string(),
            position: DVec3::new(0.5, -0.25, 1.0),
            orientation: DQuat::IDENTITY,
            label: "red_box".to_string(),
        }
    }

    #[test]
    fn test_json_lines() -> Result<(), Box<dyn std::error::Error>> {
        let mut publisher = JsonLinesPublisher::new(Vec::new());
        publisher.publish_pose(&record())?;
        publisher.publish_pose_set(&ColorPoseRecordSet {
            frame_id: "world".to_string(),
            stamp: Timestamp(42),
            poses: vec![record()],
        })?;
        publisher.publish_debug_image(&ColorImage::from_size_val(ImageSize::from([4, 2]), 0)?)?;

        let out = String::from_utf8(publisher.into_inner())?;
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);

        let pose: serde_json::Value = serde_json::from_str(lines[0])?;
        assert_eq!(pose["type"], "pose");
        assert_eq!(pose["label"], "red_box");
        assert_eq!(pose["position"][0], 0.5);

        let set: serde_json::Value = serde_json::from_str(lines[1])?;
        assert_eq!(set["type"], "pose_set");
        assert_eq!(set["poses"].as_array().map(Vec::len), Some(1));

        let image: serde_json::Value = serde_json::from_str(lines[2])?;
        assert_eq!(image["width"], 4);
        assert_eq!(image["height"], 2);
        Ok(())
    }

    #[test]
    fn test_collecting() -> Result<(), PublishError> {
        let mut publisher = CollectingPublisher::default();
        publisher.publish_pose(&record())?;
        publisher.publish_pose(&record())?;
        assert_eq!(publisher.poses.len(), 2);
        assert!(publisher.pose_sets.is_empty());
        Ok(())
    }
}
