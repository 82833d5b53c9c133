use std::collections::VecDeque;

use colorpose_image::{ColorImage, DepthImage};
use colorpose_tf::Timestamp;

use crate::camera_info::CameraInfo;
use crate::config::EstimatorConfig;

/// A color image, the registered depth image and the calibration for one instant.
#[derive(Debug, Clone)]
pub struct FrameTriple {
    /// The color image.
    pub color: ColorImage,
    /// Raw depth aligned to the color image.
    pub depth: DepthImage,
    /// Calibration of the depth camera.
    pub camera_info: CameraInfo,
    /// Acquisition time of the color image.
    pub stamp: Timestamp,
}

#[derive(Debug)]
struct StampedQueue<T> {
    // sorted by stamp, oldest first
    items: VecDeque<(Timestamp, T)>,
}

impl<T> StampedQueue<T> {
    fn new() -> Self {
        Self {
            items: VecDeque::new(),
        }
    }

    // returns the number of dropped entries
    fn push(&mut self, stamp: Timestamp, item: T, capacity: usize) -> usize {
        let pos = self.items.partition_point(|(t, _)| *t <= stamp);
        self.items.insert(pos, (stamp, item));
        let mut dropped = 0;
        while self.items.len() > capacity {
            self.items.pop_front();
            dropped += 1;
        }
        dropped
    }

    fn head(&self) -> Option<Timestamp> {
        self.items.front().map(|(t, _)| *t)
    }
}

/// Pairs color, depth and calibration messages whose stamps lie within a slop.
///
/// Each stream keeps at most `queue_size` pending messages; older ones are dropped.
/// When the oldest message of every stream lies within `slop`, the three are emitted
/// together. Otherwise the oldest of the three heads cannot be matched any more and
/// is discarded.
#[derive(Debug)]
pub struct ApproximateTimeSynchronizer {
    queue_size: usize,
    slop_ns: u64,
    color: StampedQueue<ColorImage>,
    depth: StampedQueue<DepthImage>,
    camera_info: StampedQueue<CameraInfo>,
    dropped: usize,
}

impl ApproximateTimeSynchronizer {
    /// Create a synchronizer keeping `queue_size` messages per stream and accepting
    /// stamps at most `slop` seconds apart.
    pub fn new(queue_size: usize, slop: f64) -> Self {
        Self {
            queue_size: queue_size.max(1),
            slop_ns: (slop.max(0.0) * 1e9).round() as u64,
            color: StampedQueue::new(),
            depth: StampedQueue::new(),
            camera_info: StampedQueue::new(),
            dropped: 0,
        }
    }

    /// Create a synchronizer with the queue size and slop of `config`.
    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(config.sync_queue_size, config.sync_slop)
    }

    /// Add a color image.
    pub fn push_color(&mut self, stamp: Timestamp, image: ColorImage) -> Option<FrameTriple> {
        self.dropped += self.color.push(stamp, image, self.queue_size);
        self.try_match()
    }

    /// Add a depth image.
    pub fn push_depth(&mut self, stamp: Timestamp, image: DepthImage) -> Option<FrameTriple> {
        self.dropped += self.depth.push(stamp, image, self.queue_size);
        self.try_match()
    }

    /// Add a calibration message.
    pub fn push_camera_info(&mut self, stamp: Timestamp, info: CameraInfo) -> Option<FrameTriple> {
        self.dropped += self.camera_info.push(stamp, info, self.queue_size);
        self.try_match()
    }

    /// Number of messages discarded without being matched.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of messages waiting per stream, as (color, depth, camera info).
    pub fn pending(&self) -> (usize, usize, usize) {
        (
            self.color.items.len(),
            self.depth.items.len(),
            self.camera_info.items.len(),
        )
    }

    fn try_match(&mut self) -> Option<FrameTriple> {
        loop {
            let heads = [self.color.head()?, self.depth.head()?, self.camera_info.head()?];
            let oldest = heads.iter().min().copied()?;
            let newest = heads.iter().max().copied()?;

            if newest.0 - oldest.0 <= self.slop_ns {
                let (stamp, color) = self.color.items.pop_front()?;
                let (_, depth) = self.depth.items.pop_front()?;
                let (_, camera_info) = self.camera_info.items.pop_front()?;
                return Some(FrameTriple {
                    color,
                    depth,
                    camera_info,
                    stamp,
                });
            }

            log::debug!(
                "dropping unmatched message at {:.3}s, spread {:.3}s",
                oldest.as_secs_f64(),
                newest.abs_diff_secs(oldest)
            );
            if heads[0] == oldest {
                self.color.items.pop_front();
            } else if heads[1] == oldest {
                self.depth.items.pop_front();
            } else {
                self.camera_info.items.pop_front();
            }
            self.dropped += 1;
        }
    }
}
