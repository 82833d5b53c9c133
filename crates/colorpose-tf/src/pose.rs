use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// A point in time in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Create a timestamp from seconds.
    pub fn from_secs_f64(secs: f64) -> Self {
        Self((secs.max(0.0) * 1e9).round() as u64)
    }

    /// The timestamp in seconds.
    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1e9
    }

    /// Absolute difference to another timestamp in seconds.
    pub fn abs_diff_secs(&self, other: Timestamp) -> f64 {
        self.0.abs_diff(other.0) as f64 / 1e9
    }
}

/// A position and orientation in free space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position in meters.
    pub position: DVec3,
    /// Orientation as a unit quaternion.
    pub orientation: DQuat,
}

impl Pose {
    /// A pose at `position` with identity orientation.
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
        }
    }

    /// Whether every component is finite.
    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.orientation.is_finite()
    }
}
