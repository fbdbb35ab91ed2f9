use serde::{Deserialize, Serialize};

use crate::types::Frame;

/// Per-frame scalar description of a static pose.
pub type PoseVector = Vec<f64>;

pub trait PoseDescriptor {
    /// Length of the descriptor for a frame with `landmark_count` landmarks.
    fn len_for(&self, landmark_count: usize) -> usize;
    fn describe(&self, frame: &Frame) -> PoseVector;
}

/// Squared distance of every landmark to landmark 0, divided by the largest one.
///
/// Rotation invariant in every plane; one element per landmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorDistance;

impl PoseDescriptor for AnchorDistance {
    fn len_for(&self, landmark_count: usize) -> usize {
        landmark_count
    }

    fn describe(&self, frame: &Frame) -> PoseVector {
        let Some(anchor) = frame.get(0) else {
            return Vec::new();
        };
        let distances: Vec<f64> = frame
            .landmarks
            .iter()
            .map(|l| (l.x - anchor.x).powi(2) + (l.y - anchor.y).powi(2))
            .collect();
        scale_by_max(distances)
    }
}

/// x/y offsets from landmark 0 divided by the largest absolute offset. Two elements per landmark.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnchorOffset;

impl PoseDescriptor for AnchorOffset {
    fn len_for(&self, landmark_count: usize) -> usize {
        landmark_count * 2
    }

    fn describe(&self, frame: &Frame) -> PoseVector {
        let Some(anchor) = frame.get(0) else {
            return Vec::new();
        };
        let offsets: Vec<f64> = frame
            .landmarks
            .iter()
            .flat_map(|l| [l.x - anchor.x, l.y - anchor.y])
            .collect();
        scale_by_max(offsets)
    }
}

/// dx/dy between every pair of landmarks, zero where dy vanishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairwiseRatio;

impl PoseDescriptor for PairwiseRatio {
    fn len_for(&self, landmark_count: usize) -> usize {
        landmark_count * landmark_count.saturating_sub(1) / 2
    }

    fn describe(&self, frame: &Frame) -> PoseVector {
        let l = &frame.landmarks;
        let mut ratios = Vec::with_capacity(self.len_for(l.len()));
        for i in 0..l.len() {
            for j in i + 1..l.len() {
                let dy = l[i].y - l[j].y;
                ratios.push(if dy == 0.0 { 0.0 } else { (l[i].x - l[j].x) / dy });
            }
        }
        ratios
    }
}

fn scale_by_max(mut values: Vec<f64>) -> PoseVector {
    let max = values.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    if max > 0.0 {
        values.iter_mut().for_each(|v| *v /= max);
    }
    values
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorStrategy {
    #[default]
    AnchorDistance,
    AnchorOffset,
    PairwiseRatio,
}

impl PoseDescriptor for DescriptorStrategy {
    fn len_for(&self, landmark_count: usize) -> usize {
        match self {
            DescriptorStrategy::AnchorDistance => AnchorDistance.len_for(landmark_count),
            DescriptorStrategy::AnchorOffset => AnchorOffset.len_for(landmark_count),
            DescriptorStrategy::PairwiseRatio => PairwiseRatio.len_for(landmark_count),
        }
    }

    fn describe(&self, frame: &Frame) -> PoseVector {
        match self {
            DescriptorStrategy::AnchorDistance => AnchorDistance.describe(frame),
            DescriptorStrategy::AnchorOffset => AnchorOffset.describe(frame),
            DescriptorStrategy::PairwiseRatio => PairwiseRatio.describe(frame),
        }
    }
}
