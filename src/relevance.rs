use std::collections::BTreeSet;

use glam::DVec3;

use crate::config::RelevanceConfig;
use crate::history::LandmarkHistory;
use crate::types::{Dimension, LandmarkId, Point};

pub fn mean(points: &[Point]) -> Point {
    if points.is_empty() {
        return DVec3::ZERO;
    }
    points.iter().copied().sum::<DVec3>() / points.len() as f64
}

/// Centers `points` on their mean and scales by the larger of the x/y spans.
///
/// A zero span divides by one.
pub fn normalize(points: &[Point]) -> Vec<Point> {
    if points.is_empty() {
        return Vec::new();
    }
    let (min, max) = points.iter().fold(
        (DVec3::splat(f64::INFINITY), DVec3::splat(f64::NEG_INFINITY)),
        |(lo, hi), p| (lo.min(*p), hi.max(*p)),
    );
    let span = (max.x - min.x).max(max.y - min.y);
    let axis_length = if span > 0.0 { span } else { 1.0 };
    let center = mean(points);
    points.iter().map(|p| (*p - center) / axis_length).collect()
}

/// Each interior point becomes the mean of itself and its two neighbors; an endpoint
/// becomes the mean of itself and its single neighbor.
pub fn laplacian_smoothing(points: &[Point]) -> Vec<Point> {
    let n = points.len();
    if n < 2 {
        return points.to_vec();
    }
    (0..n)
        .map(|i| {
            if i == 0 {
                (points[0] + points[1]) / 2.0
            } else if i == n - 1 {
                (points[n - 1] + points[n - 2]) / 2.0
            } else {
                (points[i - 1] + points[i] + points[i + 1]) / 3.0
            }
        })
        .collect()
}

/// Population variance per axis.
pub fn axis_variance(points: &[Point]) -> DVec3 {
    if points.is_empty() {
        return DVec3::ZERO;
    }
    let m = mean(points);
    points.iter().map(|p| (*p - m) * (*p - m)).sum::<DVec3>() / points.len() as f64
}

/// Whether a raw window moves enough to carry signal.
pub fn is_informative(points: &[Point], dimension: Dimension, config: &RelevanceConfig) -> bool {
    let smoothed = laplacian_smoothing(&normalize(points));
    let var = axis_variance(&smoothed);
    let threshold = config.threshold(dimension);
    let planar = var.x > threshold || var.y > threshold;
    match dimension {
        Dimension::TwoD => planar,
        Dimension::ThreeD => planar || var.z > threshold,
    }
}

/// Landmarks of `history` worth matching, plus `include`, minus `exclude`.
pub fn select_relevant(
    history: &LandmarkHistory,
    dimension: Dimension,
    config: &RelevanceConfig,
    include: &BTreeSet<LandmarkId>,
    exclude: &BTreeSet<LandmarkId>,
) -> BTreeSet<LandmarkId> {
    let mut selected: BTreeSet<LandmarkId> = history
        .iter()
        .filter(|(_, buffer)| !buffer.is_empty())
        .filter_map(|(id, buffer)| {
            let window: Vec<Point> = buffer.iter().copied().collect();
            is_informative(&window, dimension, config).then_some(id)
        })
        .collect();
    log::trace!("informative landmarks: {:?}", selected);
    selected.extend(include.iter().copied().filter(|id| history.contains(*id)));
    selected.retain(|id| !exclude.contains(id));
    selected
}
