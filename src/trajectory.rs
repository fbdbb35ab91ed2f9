//! Smoothing and simplification of a single landmark's trajectory.
//!
//! The pipeline is, in order: 7-tap gaussian smoothing, recentering on the mean point,
//! cubic Savitzky-Golay smoothing and Ramer-Douglas-Peucker simplification.

use std::collections::{BTreeMap, BTreeSet};

use nalgebra as na;

use crate::config::TrajectoryConfig;
use crate::error::{GestureError, Result};
use crate::history::LandmarkHistory;
use crate::relevance::mean;
use crate::types::{LandmarkId, Point};

const GAUSSIAN_RADIUS: i64 = 3;

/// `exp(-k^2 / 2 sigma^2)` for `k` in `-3..=3`, normalized to sum to one.
pub fn gaussian_kernel(sigma: f64) -> [f64; 7] {
    let mut kernel = [0.0; 7];
    for (i, k) in (-GAUSSIAN_RADIUS..=GAUSSIAN_RADIUS).enumerate() {
        let k = k as f64;
        kernel[i] = (-(k * k) / (2.0 * sigma * sigma)).exp();
    }
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|w| *w /= sum);
    kernel
}

/// Same-length convolution; samples beyond either end repeat the nearest endpoint.
pub fn gaussian_filter(points: &[Point], sigma: f64) -> Vec<Point> {
    let n = points.len() as i64;
    let kernel = gaussian_kernel(sigma);
    (0..n)
        .map(|i| {
            kernel
                .iter()
                .zip(-GAUSSIAN_RADIUS..=GAUSSIAN_RADIUS)
                .map(|(w, k)| points[(i + k).clamp(0, n - 1) as usize] * *w)
                .sum::<Point>()
        })
        .collect()
}

pub fn recenter(points: &[Point]) -> Vec<Point> {
    let center = mean(points);
    points.iter().map(|p| *p - center).collect()
}

/// Local least-squares polynomial smoother.
///
/// Each output point is the value at offset zero of a polynomial fitted over the
/// window `i - window/2 .. i - window/2 + window`, padded with the nearest endpoint.
///
/// An even window therefore spans one more sample before `i` than after it, and the
/// fit is read on the sample itself. scipy's `savgol_filter` reads an even window at
/// its half-sample center instead, so even-window output here differs slightly from
/// scipy's. Odd windows agree.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    coefficients: Vec<f64>,
    left: usize,
}

impl SavitzkyGolay {
    pub fn new(window: usize, order: usize) -> Result<SavitzkyGolay> {
        if window <= order {
            return Err(GestureError::InvalidConfig(format!(
                "savitzky-golay window {} must exceed order {}",
                window, order
            )));
        }
        let left = window / 2;
        let vandermonde = na::DMatrix::from_fn(window, order + 1, |r, c| {
            (r as f64 - left as f64).powi(c as i32)
        });
        let vt = vandermonde.transpose();
        let normal = &vt * &vandermonde;
        let inverse = normal.try_inverse().ok_or_else(|| {
            GestureError::InvalidConfig("singular savitzky-golay normal matrix".to_string())
        })?;
        let projection = inverse * vt;
        let coefficients = projection.row(0).iter().copied().collect();
        Ok(SavitzkyGolay { coefficients, left })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn apply(&self, points: &[Point]) -> Vec<Point> {
        let n = points.len() as i64;
        let left = self.left as i64;
        (0..n)
            .map(|i| {
                self.coefficients
                    .iter()
                    .enumerate()
                    .map(|(k, w)| points[(i + k as i64 - left).clamp(0, n - 1) as usize] * *w)
                    .sum::<Point>()
            })
            .collect()
    }
}

/// Distance from `p` to the line through `start` and `end`; the plain distance to
/// `start` when the two coincide.
pub fn perpendicular_distance(p: &Point, start: &Point, end: &Point) -> f64 {
    let chord = *end - *start;
    let length = chord.length();
    if length == 0.0 {
        return p.distance(*start);
    }
    (*p - *start).cross(chord).length() / length
}

/// Ramer-Douglas-Peucker simplification. Two points or fewer come back unchanged.
pub fn simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let last = points.len() - 1;
    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[last] = true;
    mark_kept(points, 0, last, tolerance, &mut keep);
    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

fn mark_kept(points: &[Point], first: usize, last: usize, tolerance: f64, keep: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    // first maximum wins ties
    let (index, dmax) = (first + 1..last)
        .map(|i| {
            (
                i,
                perpendicular_distance(&points[i], &points[first], &points[last]),
            )
        })
        .fold((first, f64::NEG_INFINITY), |best, cur| {
            if cur.1 > best.1 { cur } else { best }
        });
    if dmax > tolerance {
        keep[index] = true;
        mark_kept(points, first, index, tolerance, keep);
        mark_kept(points, index, last, tolerance, keep);
    }
}

#[derive(Debug, Clone)]
pub struct TrajectoryPreprocessor {
    sigma: f64,
    savgol: SavitzkyGolay,
    tolerance: f64,
}

impl TrajectoryPreprocessor {
    pub fn from_config(config: &TrajectoryConfig) -> Result<TrajectoryPreprocessor> {
        Ok(TrajectoryPreprocessor {
            sigma: config.gaussian_sigma,
            savgol: SavitzkyGolay::new(config.savgol_window, config.savgol_order)?,
            tolerance: config.rdp_tolerance,
        })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Raw window in, simplified translation-free polyline out.
    pub fn process(&self, raw: &[Point]) -> Vec<Point> {
        if raw.is_empty() {
            return Vec::new();
        }
        let smoothed = gaussian_filter(raw, self.sigma);
        let centered = recenter(&smoothed);
        let fitted = self.savgol.apply(&centered);
        simplify(&fitted, self.tolerance)
    }
}

/// Processes the windows of every landmark in `selection` that the history tracks.
pub fn process_landmarks(
    history: &LandmarkHistory,
    selection: &BTreeSet<LandmarkId>,
    preprocessor: &TrajectoryPreprocessor,
) -> BTreeMap<LandmarkId, Vec<Point>> {
    selection
        .iter()
        .filter_map(|id| {
            history
                .window(*id)
                .map(|window| (*id, preprocessor.process(&window)))
        })
        .collect()
}
