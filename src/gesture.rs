//! Dynamic gesture matching against stored trajectory templates.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::GestureConfig;
use crate::descriptor::PoseVector;
use crate::dtw::dtw_distance;
use crate::history::LandmarkHistory;
use crate::pose::{AnchorPose, PoseMatcher};
use crate::template::GestureTemplate;
use crate::trajectory::TrajectoryPreprocessor;
use crate::types::{LandmarkId, MatchResult, Point};

/// Elastic distance between a live and a stored trajectory.
pub type DistanceFn = fn(&[Point], &[Point]) -> f64;

/// The live state one gesture decision is made on.
#[derive(Debug, Clone, Copy)]
pub struct GestureQuery<'a> {
    pub history: &'a LandmarkHistory,
    /// Pose of the oldest frame in the window.
    pub pose_at_start: Option<&'a PoseVector>,
    /// Pose of the newest frame in the window.
    pub pose_at_end: Option<&'a PoseVector>,
}

#[derive(Debug, Clone)]
pub struct GestureMatcher {
    config: GestureConfig,
    preprocessor: TrajectoryPreprocessor,
    anchor_gate: PoseMatcher,
    distance: DistanceFn,
}

impl GestureMatcher {
    pub fn new(
        config: GestureConfig,
        preprocessor: TrajectoryPreprocessor,
        anchor_gate: PoseMatcher,
    ) -> GestureMatcher {
        GestureMatcher {
            config,
            preprocessor,
            anchor_gate,
            distance: dtw_distance,
        }
    }

    pub fn with_distance(mut self, distance: DistanceFn) -> Self {
        self.distance = distance;
        self
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn preprocessor(&self) -> &TrajectoryPreprocessor {
        &self.preprocessor
    }

    /// Whether more than the allowed fraction of `id`'s window is untracked.
    pub fn is_occluded(&self, history: &LandmarkHistory, id: LandmarkId) -> bool {
        let len = history.len(id);
        len > 0
            && history.occluded_count(id) as f64 > self.config.max_occluded_fraction * len as f64
    }

    /// Accept bound for a template; busier templates tolerate more distance.
    pub fn threshold_for(&self, template: &GestureTemplate) -> f64 {
        self.config.base_threshold + self.config.point_coefficient * template.point_count() as f64
    }

    /// Mean per-landmark distance, `None` if a template landmark has no live trajectory.
    pub fn aggregate_distance(
        &self,
        template: &GestureTemplate,
        processed: &BTreeMap<LandmarkId, Vec<Point>>,
    ) -> Option<f64> {
        if template.points.is_empty() {
            return None;
        }
        let mut total = 0.0;
        for (id, stored) in &template.points {
            let live = processed.get(id)?;
            total += (self.distance)(live, stored);
        }
        Some(total / template.points.len() as f64)
    }

    pub fn anchors_pass(&self, template: &GestureTemplate, query: &GestureQuery) -> bool {
        let gate = |anchor: Option<&AnchorPose>, pose: Option<&PoseVector>| match (anchor, pose) {
            (None, _) => true,
            (Some(anchor), Some(pose)) => self.anchor_gate.check_anchor(pose, anchor),
            (Some(_), None) => false,
        };
        gate(template.anchor_first.as_ref(), query.pose_at_start)
            && gate(template.anchor_last.as_ref(), query.pose_at_end)
    }

    /// Best accepted template for the current window, or `None`.
    ///
    /// The whole cycle is abandoned when any landmark a template needs is occluded.
    pub fn best_match<'a>(
        &self,
        templates: impl IntoIterator<Item = &'a GestureTemplate>,
        query: &GestureQuery,
    ) -> Option<MatchResult> {
        let templates: Vec<&GestureTemplate> = templates.into_iter().collect();
        let required: BTreeSet<LandmarkId> = templates
            .iter()
            .flat_map(|t| t.landmark_ids())
            .filter(|id| query.history.contains(*id))
            .collect();
        if let Some(id) = required.iter().find(|id| self.is_occluded(query.history, **id)) {
            log::debug!("landmark {} is not reliably tracked, skipping this window", id);
            return None;
        }

        let processed: BTreeMap<LandmarkId, Vec<Point>> = required
            .iter()
            .filter_map(|id| {
                query
                    .history
                    .window(*id)
                    .map(|w| (*id, self.preprocessor.process(&w)))
            })
            .collect();

        let mut best: Option<MatchResult> = None;
        for template in templates {
            if !self.anchors_pass(template, query) {
                log::trace!("{} rejected by its anchor pose", template.name);
                continue;
            }
            let Some(distance) = self.aggregate_distance(template, &processed) else {
                log::trace!("{} needs landmarks outside the tracked topology", template.name);
                continue;
            };
            let threshold = self.threshold_for(template);
            log::debug!(
                "{}: distance {:.4}, threshold {:.4}",
                template.name,
                distance,
                threshold
            );
            if distance < threshold && best.as_ref().is_none_or(|b| distance < b.score) {
                best = Some(MatchResult::new(template.name.clone(), distance));
            }
        }
        best
    }

    /// Whether a match on `template_name` should empty the history.
    pub fn clears_history(&self, template_name: &str) -> bool {
        !self
            .config
            .continuous_templates
            .iter()
            .any(|n| n == template_name)
    }
}
