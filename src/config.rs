use serde::{Deserialize, Serialize};

use crate::descriptor::DescriptorStrategy;
use crate::error::{GestureError, Result};
use crate::types::{Dimension, LandmarkId};

/// Which matcher the live recognizer consults each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Dtw,
    CyclicPermutation,
    Deviation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelevanceConfig {
    pub threshold_2d: f64,
    pub threshold_3d: f64,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            threshold_2d: 0.1,
            threshold_3d: 0.125,
        }
    }
}

impl RelevanceConfig {
    pub fn threshold(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::TwoD => self.threshold_2d,
            Dimension::ThreeD => self.threshold_3d,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryConfig {
    pub gaussian_sigma: f64,
    pub savgol_window: usize,
    pub savgol_order: usize,
    pub rdp_tolerance: f64,
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            gaussian_sigma: 2.0,
            savgol_window: 8,
            savgol_order: 3,
            rdp_tolerance: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    /// Largest per-element deviation that still counts as correct.
    pub leniency: f64,
    /// Fraction of elements that must be correct.
    pub threshold: f64,
    pub descriptor: DescriptorStrategy,
    /// How many recent frames a keyframe sequence may span.
    pub sequence_history: usize,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            leniency: 0.3,
            threshold: 0.99,
            descriptor: DescriptorStrategy::AnchorDistance,
            sequence_history: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub base_threshold: f64,
    /// Added to the threshold once per stored template point.
    pub point_coefficient: f64,
    /// A landmark whose window holds more sentinel samples than this fraction is untracked.
    pub max_occluded_fraction: f64,
    /// Templates that keep the history after a match.
    pub continuous_templates: Vec<String>,
    /// Frames a match stays "recent" for.
    pub decay_frames: u32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            base_threshold: 0.77,
            point_coefficient: 0.01,
            max_occluded_fraction: 0.5,
            continuous_templates: vec!["double_wave".to_string()],
            decay_frames: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub countdown_ms: u64,
    pub record_end_anchor: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            countdown_ms: 3000,
            record_end_anchor: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window_len: usize,
    pub visibility_floor: f64,
    pub dimension: Dimension,
    /// Landmark ids tracked by the history buffer.
    pub topology: Vec<LandmarkId>,
    pub strategy: Strategy,
    pub relevance: RelevanceConfig,
    pub trajectory: TrajectoryConfig,
    pub pose: PoseConfig,
    pub gesture: GestureConfig,
    pub session: SessionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_len: 25,
            visibility_floor: 0.7,
            dimension: Dimension::TwoD,
            // shoulders, elbows and wrists of the 33-point body topology
            topology: vec![11, 12, 13, 14, 15, 16],
            strategy: Strategy::Dtw,
            relevance: RelevanceConfig::default(),
            trajectory: TrajectoryConfig::default(),
            pose: PoseConfig::default(),
            gesture: GestureConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &str) -> Result<EngineConfig> {
        let config: EngineConfig = crate::io::object_from_json(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_len == 0 {
            return Err(GestureError::InvalidConfig(
                "window_len must be positive".to_string(),
            ));
        }
        if self.trajectory.savgol_window <= self.trajectory.savgol_order {
            return Err(GestureError::InvalidConfig(format!(
                "savgol_window {} must exceed savgol_order {}",
                self.trajectory.savgol_window, self.trajectory.savgol_order
            )));
        }
        let sigma = self.trajectory.gaussian_sigma;
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(GestureError::InvalidConfig(format!(
                "gaussian_sigma {} must be positive",
                sigma
            )));
        }
        let tolerance = self.trajectory.rdp_tolerance;
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(GestureError::InvalidConfig(format!(
                "rdp_tolerance {} must not be negative",
                tolerance
            )));
        }
        let leniency = self.pose.leniency;
        if leniency.is_nan() || leniency <= 0.0 || leniency >= 1.0 {
            return Err(GestureError::InvalidConfig(format!(
                "pose leniency {} outside (0, 1)",
                leniency
            )));
        }
        if !(0.0..=1.0).contains(&self.pose.threshold) {
            return Err(GestureError::InvalidConfig(format!(
                "pose threshold {} outside [0, 1]",
                self.pose.threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.gesture.max_occluded_fraction) {
            return Err(GestureError::InvalidConfig(format!(
                "max_occluded_fraction {} outside [0, 1]",
                self.gesture.max_occluded_fraction
            )));
        }
        Ok(())
    }
}
