//! Fixed-capacity per-landmark ring buffers.
//!
//! The set of tracked landmarks is fixed at construction. Pushing a sample for an id
//! outside that topology is a no-op, so `is_full` can never be held back by a buffer
//! that was registered halfway through a window.

use std::collections::{BTreeMap, VecDeque};

use crate::types::{Dimension, Frame, LandmarkId, Point, SENTINEL, is_sentinel};

#[derive(Debug, Clone)]
pub struct LandmarkHistory {
    capacity: usize,
    buffers: BTreeMap<LandmarkId, VecDeque<Point>>,
}

impl LandmarkHistory {
    pub fn new(topology: &[LandmarkId], capacity: usize) -> LandmarkHistory {
        let capacity = capacity.max(1);
        let buffers = topology
            .iter()
            .map(|id| (*id, VecDeque::with_capacity(capacity)))
            .collect();
        LandmarkHistory { capacity, buffers }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends `point`, evicting the oldest sample once the buffer holds `capacity` points.
    ///
    /// Returns `false` when `id` is not part of the topology.
    pub fn push(&mut self, id: LandmarkId, point: Point) -> bool {
        let Some(buffer) = self.buffers.get_mut(&id) else {
            log::trace!("ignoring sample for untracked landmark {}", id);
            return false;
        };
        if buffer.len() == self.capacity {
            buffer.pop_front();
        }
        buffer.push_back(point);
        true
    }

    /// Pushes every tracked landmark of `frame`; missing or low-confidence samples become
    /// the sentinel.
    pub fn push_frame(&mut self, frame: &Frame, visibility_floor: f64, dimension: Dimension) {
        let capacity = self.capacity;
        for (id, buffer) in self.buffers.iter_mut() {
            let point = frame
                .get(*id)
                .map(|s| s.position(visibility_floor, dimension))
                .unwrap_or(SENTINEL);
            if buffer.len() == capacity {
                buffer.pop_front();
            }
            buffer.push_back(point);
        }
    }

    /// True when every tracked landmark holds exactly `capacity` samples.
    pub fn is_full(&self) -> bool {
        !self.buffers.is_empty() && self.buffers.values().all(|b| b.len() == self.capacity)
    }

    pub fn clear(&mut self) {
        for buffer in self.buffers.values_mut() {
            buffer.clear();
        }
    }

    pub fn contains(&self, id: LandmarkId) -> bool {
        self.buffers.contains_key(&id)
    }

    pub fn len(&self, id: LandmarkId) -> usize {
        self.buffers.get(&id).map(|b| b.len()).unwrap_or(0)
    }

    pub fn landmark_ids(&self) -> impl Iterator<Item = LandmarkId> + '_ {
        self.buffers.keys().copied()
    }

    /// Oldest to newest samples of one landmark.
    pub fn window(&self, id: LandmarkId) -> Option<Vec<Point>> {
        self.buffers.get(&id).map(|b| b.iter().copied().collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, &VecDeque<Point>)> {
        self.buffers.iter().map(|(id, b)| (*id, b))
    }

    pub fn occluded_count(&self, id: LandmarkId) -> usize {
        self.buffers
            .get(&id)
            .map(|b| b.iter().filter(|p| is_sentinel(p)).count())
            .unwrap_or(0)
    }
}
