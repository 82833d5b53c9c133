use colorpose_tf::Timestamp;
use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// The world pose of one labelled object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPoseRecord {
    /// Frame the pose is expressed in.
    pub frame_id: String,
    /// Position in meters.
    pub position: DVec3,
    /// Orientation; always the identity, no object rotation is estimated.
    pub orientation: DQuat,
    /// Label such as `red_box`.
    pub label: String,
}

/// Every record produced for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorPoseRecordSet {
    /// Frame the poses are expressed in.
    pub frame_id: String,
    /// Stamp of the frame the poses were computed from.
    pub stamp: Timestamp,
    /// The records, in production order.
    pub poses: Vec<ColorPoseRecord>,
}

impl ColorPoseRecordSet {
    /// Find the first record with `label`.
    pub fn get(&self, label: &str) -> Option<&ColorPoseRecord> {
        self.poses.iter().find(|r| r.label == label)
    }
}
