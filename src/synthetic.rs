//! Seeded synthetic recordings.

use std::f64::consts::TAU;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::recording::Recording;
use crate::types::{Frame, LandmarkId, LandmarkSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    HorizontalLine,
    VerticalLine,
    Circle,
    /// Two side to side swings.
    Wave,
    Still,
}

impl Shape {
    /// Offset from the rest position at `t` in `[0, 1]`, for unit amplitude.
    pub fn offset(&self, t: f64) -> (f64, f64) {
        match self {
            Shape::HorizontalLine => (t - 0.5, 0.0),
            Shape::VerticalLine => (0.0, t - 0.5),
            Shape::Circle => (0.5 * (TAU * t).cos(), 0.5 * (TAU * t).sin()),
            Shape::Wave => (0.5 * (2.0 * TAU * t).sin(), 0.0),
            Shape::Still => (0.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticSpec {
    pub shape: Shape,
    pub frames: usize,
    /// Landmarks per frame; ids not in `moving` stay at their rest position.
    pub landmark_count: usize,
    pub moving: Vec<LandmarkId>,
    pub amplitude: f64,
    /// Half width of the uniform jitter added to every coordinate.
    pub noise: f64,
    /// Probability that a frame has no subject at all.
    pub dropout: f64,
    pub confidence: f64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            shape: Shape::Wave,
            frames: 25,
            landmark_count: 33,
            moving: vec![15],
            amplitude: 1.0,
            noise: 0.0,
            dropout: 0.0,
            confidence: 1.0,
        }
    }
}

impl SyntheticSpec {
    pub fn new(shape: Shape, frames: usize) -> SyntheticSpec {
        SyntheticSpec {
            shape,
            frames,
            ..Default::default()
        }
    }
}

/// Rest position of a landmark; distinct per id and never the origin.
pub fn rest_position(id: LandmarkId) -> (f64, f64) {
    (0.3 + 0.01 * id as f64, 0.4 + 0.005 * id as f64)
}

pub fn synthesize_frame(spec: &SyntheticSpec, t: f64, rng: &mut ChaCha8Rng) -> Frame {
    let (dx, dy) = spec.shape.offset(t);
    let landmarks = (0..spec.landmark_count)
        .map(|id| {
            let (mut x, mut y) = rest_position(id);
            if spec.moving.contains(&id) {
                x += spec.amplitude * dx;
                y += spec.amplitude * dy;
            }
            if spec.noise > 0.0 {
                x += rng.random_range(-spec.noise..spec.noise);
                y += rng.random_range(-spec.noise..spec.noise);
            }
            LandmarkSample::new_2d(x, y, spec.confidence)
        })
        .collect();
    Frame::new(landmarks)
}

pub fn synthesize_recording(spec: &SyntheticSpec, seed: u64) -> Recording {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let last = spec.frames.saturating_sub(1).max(1) as f64;
    let frames = (0..spec.frames)
        .map(|i| {
            if spec.dropout > 0.0 && rng.random_bool(spec.dropout.min(1.0)) {
                None
            } else {
                Some(synthesize_frame(spec, i as f64 / last, &mut rng))
            }
        })
        .collect();
    Recording::new(frames)
}
