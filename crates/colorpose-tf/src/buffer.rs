use std::collections::{HashMap, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use colorpose_3d::RigidTransform;

use crate::cancel::CancellationToken;
use crate::error::TransformError;
use crate::pose::Timestamp;
use crate::service::TransformService;

/// How long samples are kept behind the newest one, per edge.
pub const DEFAULT_CACHE_TIME: Duration = Duration::from_secs(1);

// upper bound on a single condvar wait so cancellation is noticed promptly
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Default)]
struct Edge {
    static_tf: Option<RigidTransform>,
    // sorted by stamp, oldest first
    samples: VecDeque<(Timestamp, RigidTransform)>,
}

enum Resolution {
    Found(RigidTransform),
    Failed(String),
    Pending(String),
}

impl Edge {
    fn insert(&mut self, stamp: Timestamp, tf: RigidTransform, cache_time: Duration) {
        let pos = self.samples.partition_point(|(t, _)| *t <= stamp);
        self.samples.insert(pos, (stamp, tf));

        if let Some((newest, _)) = self.samples.back().copied() {
            let horizon = newest.0.saturating_sub(cache_time.as_nanos() as u64);
            while self.samples.front().is_some_and(|(t, _)| t.0 < horizon) {
                self.samples.pop_front();
            }
        }
    }

    fn at(&self, time: Option<Timestamp>) -> Resolution {
        if let Some(tf) = self.static_tf {
            return Resolution::Found(tf);
        }
        let (Some(oldest), Some(newest)) = (self.samples.front(), self.samples.back()) else {
            return Resolution::Pending("no data received yet".to_string());
        };
        let Some(time) = time else {
            return Resolution::Found(newest.1);
        };
        if time < oldest.0 {
            return Resolution::Failed(format!(
                "requested time {:.6}s is older than the oldest sample {:.6}s",
                time.as_secs_f64(),
                oldest.0.as_secs_f64()
            ));
        }
        if time > newest.0 {
            return Resolution::Pending(format!(
                "requested time {:.6}s is newer than the newest sample {:.6}s",
                time.as_secs_f64(),
                newest.0.as_secs_f64()
            ));
        }

        let pos = self.samples.partition_point(|(t, _)| *t <= time);
        let (t0, tf0) = self.samples[pos - 1];
        if t0 == time || pos == self.samples.len() {
            return Resolution::Found(tf0);
        }
        let (t1, tf1) = self.samples[pos];
        let ratio = (time.0 - t0.0) as f64 / (t1.0 - t0.0) as f64;
        Resolution::Found(RigidTransform {
            rotation: tf0.rotation.slerp(tf1.rotation, ratio),
            translation: tf0.translation.lerp(tf1.translation, ratio),
        })
    }
}

/// A minimal in-memory [`TransformService`].
///
/// Stores direct parent to child relationships and answers queries for a frame
/// pair connected by a single edge, in either direction. Chains through
/// intermediate frames are not resolved. Dynamic samples are interpolated in time.
#[derive(Debug)]
pub struct StaticTransformBuffer {
    edges: Mutex<HashMap<(String, String), Edge>>,
    updated: Condvar,
    cache_time: Duration,
    cancel: CancellationToken,
}

impl Default for StaticTransformBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TIME)
    }
}

impl StaticTransformBuffer {
    /// Create an empty buffer keeping `cache_time` of history per edge.
    pub fn new(cache_time: Duration) -> Self {
        Self {
            edges: Mutex::new(HashMap::new()),
            updated: Condvar::new(),
            cache_time,
            cancel: CancellationToken::new(),
        }
    }

    /// Abandon blocking lookups once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<(String, String), Edge>>, String> {
        self.edges
            .lock()
            .map_err(|_| "transform buffer lock poisoned".to_string())
    }

    /// Set a transform valid at all times; `parent_T_child` maps child points into the parent.
    pub fn set_static_transform(&self, parent: &str, child: &str, parent_t_child: RigidTransform) {
        match self.lock() {
            Ok(mut edges) => {
                edges
                    .entry((parent.to_string(), child.to_string()))
                    .or_default()
                    .static_tf = Some(parent_t_child);
            }
            Err(e) => log::error!("{e}"),
        }
        self.updated.notify_all();
    }

    /// Add a time-stamped sample of `parent_T_child`.
    pub fn set_transform(
        &self,
        parent: &str,
        child: &str,
        parent_t_child: RigidTransform,
        stamp: Timestamp,
    ) {
        match self.lock() {
            Ok(mut edges) => {
                edges
                    .entry((parent.to_string(), child.to_string()))
                    .or_default()
                    .insert(stamp, parent_t_child, self.cache_time);
            }
            Err(e) => log::error!("{e}"),
        }
        self.updated.notify_all();
    }

    /// Names of every frame known to the buffer, sorted.
    pub fn frames(&self) -> Vec<String> {
        let Ok(edges) = self.lock() else {
            return Vec::new();
        };
        let mut frames = edges
            .keys()
            .flat_map(|(p, c)| [p.clone(), c.clone()])
            .collect::<Vec<_>>();
        frames.sort();
        frames.dedup();
        frames
    }

    fn resolve(
        edges: &HashMap<(String, String), Edge>,
        source_frame: &str,
        target_frame: &str,
        time: Option<Timestamp>,
    ) -> Resolution {
        if source_frame == target_frame {
            return Resolution::Found(RigidTransform::IDENTITY);
        }
        // stored edges are parent_T_child: target_T_source directly, or its inverse
        if let Some(edge) = edges.get(&(target_frame.to_string(), source_frame.to_string())) {
            return edge.at(time);
        }
        if let Some(edge) = edges.get(&(source_frame.to_string(), target_frame.to_string())) {
            return match edge.at(time) {
                Resolution::Found(tf) => Resolution::Found(tf.inverse()),
                other => other,
            };
        }
        Resolution::Pending(format!(
            "frames '{source_frame}' and '{target_frame}' are not connected"
        ))
    }
}

impl TransformService for StaticTransformBuffer {
    fn lookup(
        &self,
        source_frame: &str,
        target_frame: &str,
        time: Option<Timestamp>,
        timeout: Duration,
    ) -> Result<RigidTransform, TransformError> {
        let deadline = Instant::now() + timeout;
        let mut edges = self
            .lock()
            .map_err(|e| TransformError::lookup(source_frame, target_frame, e))?;

        loop {
            let reason = match Self::resolve(&edges, source_frame, target_frame, time) {
                Resolution::Found(tf) => return Ok(tf),
                Resolution::Failed(reason) => {
                    return Err(TransformError::lookup(source_frame, target_frame, reason))
                }
                Resolution::Pending(reason) => reason,
            };

            if self.cancel.is_cancelled() {
                return Err(TransformError::Cancelled);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(TransformError::lookup(
                    source_frame,
                    target_frame,
                    format!("timed out after {timeout:?}: {reason}"),
                ));
            }

            let wait = (deadline - now).min(POLL_INTERVAL);
            edges = self
                .updated
                .wait_timeout(edges, wait)
                .map_err(|_| {
                    TransformError::lookup(source_frame, target_frame, "transform buffer lock poisoned")
                })?
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DVec3;
    use std::sync::Arc;

    const SHORT: Duration = Duration::from_millis(20);

    #[test]
    fn test_identity_same_frame() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        let tf = buffer.lookup("world", "world", None, SHORT)?;
        assert_eq!(tf, RigidTransform::IDENTITY);
        Ok(())
    }

    #[test]
    fn test_direct_and_inverse() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        let world_t_camera = RigidTransform::from_translation(DVec3::new(0.0, 0.0, 1.0));
        buffer.set_static_transform("world", "camera", world_t_camera);

        let tf = buffer.lookup("camera", "world", None, SHORT)?;
        assert_eq!(tf.transform_point(DVec3::ZERO), DVec3::new(0.0, 0.0, 1.0));

        let tf = buffer.lookup("world", "camera", None, SHORT)?;
        assert_eq!(tf.transform_point(DVec3::ZERO), DVec3::new(0.0, 0.0, -1.0));

        assert_eq!(buffer.frames(), vec!["camera".to_string(), "world".to_string()]);
        Ok(())
    }

    #[test]
    fn test_unknown_frame_times_out() {
        let buffer = StaticTransformBuffer::default();
        let res = buffer.lookup("camera", "world", None, SHORT);
        assert!(matches!(res, Err(TransformError::LookupFailure { .. })));
    }

    #[test]
    fn test_no_chaining() {
        let buffer = StaticTransformBuffer::default();
        buffer.set_static_transform("world", "base", RigidTransform::IDENTITY);
        buffer.set_static_transform("base", "camera", RigidTransform::IDENTITY);
        assert!(buffer
            .lookup("camera", "world", None, SHORT)
            .is_err());
    }

    #[test]
    fn test_interpolation() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        let t0 = Timestamp::from_secs_f64(10.0);
        let t1 = Timestamp::from_secs_f64(10.2);
        buffer.set_transform("world", "camera", RigidTransform::from_translation(DVec3::ZERO), t0);
        buffer.set_transform("world", "camera", RigidTransform::from_translation(DVec3::X), t1);

        let tf = buffer.lookup("camera", "world", Some(Timestamp::from_secs_f64(10.05)), SHORT)?;
        assert_relative_eq!(tf.translation.x, 0.25, epsilon = 1e-9);

        let tf = buffer.lookup("camera", "world", None, SHORT)?;
        assert_eq!(tf.translation, DVec3::X);

        let past = buffer.lookup("camera", "world", Some(Timestamp::from_secs_f64(9.0)), SHORT);
        assert!(matches!(past, Err(TransformError::LookupFailure { .. })));
        Ok(())
    }

    #[test]
    fn test_epoch_stamp_is_not_latest() -> Result<(), TransformError> {
        let buffer = StaticTransformBuffer::default();
        buffer.set_transform("world", "camera", RigidTransform::IDENTITY, Timestamp(0));
        buffer.set_transform(
            "world",
            "camera",
            RigidTransform::from_translation(DVec3::X),
            Timestamp::from_secs_f64(1.0),
        );

        let tf = buffer.lookup("camera", "world", Some(Timestamp(0)), SHORT)?;
        assert_eq!(tf.translation, DVec3::ZERO);

        let tf = buffer.lookup("camera", "world", None, SHORT)?;
        assert_eq!(tf.translation, DVec3::X);
        Ok(())
    }

    #[test]
    fn test_cache_time_evicts_old_samples() {
        let buffer = StaticTransformBuffer::new(Duration::from_secs(1));
        buffer.set_transform("world", "camera", RigidTransform::IDENTITY, Timestamp::from_secs_f64(1.0));
        buffer.set_transform("world", "camera", RigidTransform::IDENTITY, Timestamp::from_secs_f64(5.0));
        let res = buffer.lookup("camera", "world", Some(Timestamp::from_secs_f64(2.0)), SHORT);
        assert!(matches!(res, Err(TransformError::LookupFailure { .. })));
    }

    #[test]
    fn test_waits_for_late_transform() -> Result<(), TransformError> {
        let buffer = Arc::new(StaticTransformBuffer::default());
        let writer = buffer.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            writer.set_static_transform("world", "camera", RigidTransform::IDENTITY);
        });
        let tf = buffer.lookup("camera", "world", None, Duration::from_secs(2))?;
        assert_eq!(tf, RigidTransform::IDENTITY);
        handle.join().expect("writer thread panicked");
        Ok(())
    }

    #[test]
    fn test_cancelled_lookup() {
        let cancel = CancellationToken::new();
        let buffer = StaticTransformBuffer::default().with_cancellation(cancel.clone());
        cancel.cancel();
        let res = buffer.lookup("camera", "world", None, Duration::from_secs(5));
        assert_eq!(res, Err(TransformError::Cancelled));
    }
}
