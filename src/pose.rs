//! Static pose comparison: a per-element deviation gate followed by best-of ranking.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::PoseConfig;
use crate::descriptor::PoseVector;
use crate::template::PoseTemplate;
use crate::types::MatchResult;

const COUNT_EPSILON: f64 = 1e-9;

/// A static pose a gesture has to start or end in.
///
/// `Dense` gates every element, `Sparse` only the listed indices (keyed by the index
/// written as a string, as in the template files).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnchorPose {
    Dense(PoseVector),
    Sparse(BTreeMap<String, f64>),
}

impl AnchorPose {
    pub fn sparse(entries: impl IntoIterator<Item = (usize, f64)>) -> AnchorPose {
        AnchorPose::Sparse(entries.into_iter().map(|(i, v)| (i.to_string(), v)).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    /// Elements off by more than the leniency.
    pub wrong: usize,
    pub mean: f64,
}

/// Element-wise comparison; `None` when the lengths differ or both are empty.
pub fn deviation(candidate: &[f64], reference: &[f64], leniency: f64) -> Option<Deviation> {
    if candidate.len() != reference.len() || candidate.is_empty() {
        return None;
    }
    let (wrong, total) = candidate
        .iter()
        .zip(reference)
        .map(|(c, r)| (c - r).abs())
        .fold((0usize, 0.0f64), |(wrong, total), d| {
            (wrong + usize::from(d > leniency), total + d)
        });
    Some(Deviation {
        wrong,
        mean: total / candidate.len() as f64,
    })
}

/// How many wrong elements `len` elements may carry at `threshold`.
pub fn allowed_wrong(len: usize, threshold: f64) -> f64 {
    len as f64 * (1.0 - threshold)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMatcher {
    pub leniency: f64,
    pub threshold: f64,
}

impl Default for PoseMatcher {
    fn default() -> Self {
        PoseMatcher::from_config(&PoseConfig::default())
    }
}

impl PoseMatcher {
    pub fn new(leniency: f64, threshold: f64) -> PoseMatcher {
        PoseMatcher {
            leniency,
            threshold,
        }
    }

    pub fn from_config(config: &PoseConfig) -> PoseMatcher {
        PoseMatcher::new(config.leniency, config.threshold)
    }

    fn passes(&self, wrong: usize, len: usize) -> bool {
        wrong as f64 <= allowed_wrong(len, self.threshold) + COUNT_EPSILON
    }

    /// Mean deviation of `candidate` against `reference` if it passes the gate.
    pub fn score(&self, candidate: &[f64], reference: &[f64]) -> Option<f64> {
        let d = deviation(candidate, reference, self.leniency)?;
        self.passes(d.wrong, candidate.len()).then_some(d.mean)
    }

    pub fn check(&self, candidate: &[f64], reference: &[f64]) -> bool {
        self.score(candidate, reference).is_some()
    }

    pub fn check_anchor(&self, pose: &[f64], anchor: &AnchorPose) -> bool {
        match anchor {
            AnchorPose::Dense(reference) => self.check(pose, reference),
            AnchorPose::Sparse(entries) => {
                if entries.is_empty() {
                    return true;
                }
                let wrong = entries
                    .iter()
                    .filter(|(idx, value)| {
                        match idx.parse::<usize>().ok().and_then(|i| pose.get(i)) {
                            Some(v) => (v - **value).abs() > self.leniency,
                            None => true,
                        }
                    })
                    .count();
                self.passes(wrong, entries.len())
            }
        }
    }

    /// Lowest mean deviation among the templates that pass the gate. Ties keep the earlier
    /// template.
    pub fn best_match<'a>(
        &self,
        candidate: &[f64],
        templates: impl IntoIterator<Item = &'a PoseTemplate>,
    ) -> Option<MatchResult> {
        self.best_by(templates, |t| self.score(candidate, &t.vector))
    }

    /// Like [`check`](Self::check) against every cyclic rotation of `reference`; the best
    /// passing rotation's mean deviation.
    pub fn score_cyclic(&self, candidate: &[f64], reference: &[f64]) -> Option<f64> {
        if candidate.len() != reference.len() || candidate.is_empty() {
            return None;
        }
        let mut rotated = reference.to_vec();
        let mut best: Option<f64> = None;
        for _ in 0..reference.len() {
            if let Some(mean) = self.score(candidate, &rotated) {
                if best.is_none_or(|b| mean < b) {
                    best = Some(mean);
                }
            }
            rotated.rotate_left(1);
        }
        best
    }

    pub fn check_cyclic(&self, candidate: &[f64], reference: &[f64]) -> bool {
        self.score_cyclic(candidate, reference).is_some()
    }

    pub fn best_cyclic_match<'a>(
        &self,
        candidate: &[f64],
        templates: impl IntoIterator<Item = &'a PoseTemplate>,
    ) -> Option<MatchResult> {
        self.best_by(templates, |t| self.score_cyclic(candidate, &t.vector))
    }

    fn best_by<'a>(
        &self,
        templates: impl IntoIterator<Item = &'a PoseTemplate>,
        score: impl Fn(&PoseTemplate) -> Option<f64>,
    ) -> Option<MatchResult> {
        let mut best: Option<MatchResult> = None;
        for template in templates {
            let Some(mean) = score(template) else {
                continue;
            };
            log::trace!("pose {} passes with mean deviation {:.4}", template.name, mean);
            if best.as_ref().is_none_or(|b| mean < b.score) {
                best = Some(MatchResult::new(template.name.clone(), mean));
            }
        }
        best
    }
}

/// A gesture expressed as poses that must be struck in order.
///
/// Each observed frame records which keyframe it matched (1-based, 0 for none) in a
/// bounded history. The gesture completes once the history contains the keyframes
/// 1, 2, .., n in order. Non-matching frames and repeats of the current keyframe are
/// ignored, a hit on keyframe 1 restarts the sequence, any other hit resets it.
#[derive(Debug, Clone)]
pub struct KeyframeSequence {
    keyframes: Vec<PoseVector>,
    hits: VecDeque<usize>,
    history_len: usize,
}

impl KeyframeSequence {
    pub fn new(keyframes: Vec<PoseVector>, history_len: usize) -> KeyframeSequence {
        KeyframeSequence {
            keyframes,
            hits: VecDeque::with_capacity(history_len.max(1)),
            history_len: history_len.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Adds a keyframe while fewer than `max` are stored.
    pub fn push_keyframe(&mut self, pose: PoseVector, max: usize) -> bool {
        if self.keyframes.len() >= max {
            return false;
        }
        self.keyframes.push(pose);
        true
    }

    pub fn reset(&mut self) {
        self.hits.clear();
    }

    /// Feeds one frame; returns true when the sequence just completed.
    pub fn observe(&mut self, matcher: &PoseMatcher, pose: &[f64]) -> bool {
        if self.keyframes.is_empty() {
            return false;
        }
        let hit = self
            .keyframes
            .iter()
            .position(|k| matcher.check(pose, k))
            .map(|i| i + 1)
            .unwrap_or(0);
        if self.hits.len() == self.history_len {
            self.hits.pop_front();
        }
        self.hits.push_back(hit);

        let mut found = 0;
        for &num in &self.hits {
            if num == 0 {
                continue;
            }
            if num == found + 1 {
                found = num;
            } else if num == found {
                // holding the current keyframe
            } else if num == 1 {
                found = 1;
            } else {
                found = 0;
            }
            if found == self.keyframes.len() {
                self.hits.clear();
                return true;
            }
        }
        false
    }
}
