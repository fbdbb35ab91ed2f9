use std::collections::{BTreeMap, BTreeSet};

use landmark_gesture::config::{GestureConfig, TrajectoryConfig};
use landmark_gesture::dtw::dtw_distance;
use landmark_gesture::gesture::{GestureMatcher, GestureQuery};
use landmark_gesture::history::LandmarkHistory;
use landmark_gesture::pose::{AnchorPose, PoseMatcher};
use landmark_gesture::template::GestureTemplate;
use landmark_gesture::trajectory::TrajectoryPreprocessor;
use landmark_gesture::types::{Point, SENTINEL};

const ID: usize = 3;

fn matcher() -> GestureMatcher {
    let preprocessor = TrajectoryPreprocessor::from_config(&TrajectoryConfig::default()).unwrap();
    GestureMatcher::new(GestureConfig::default(), preprocessor, PoseMatcher::default())
}

fn history_of(points: &[Point]) -> LandmarkHistory {
    let mut history = LandmarkHistory::new(&[ID], points.len());
    for p in points {
        history.push(ID, *p);
    }
    history
}

fn horizontal() -> Vec<Point> {
    (0..16).map(|i| Point::new(i as f64, 0.0, 0.0)).collect()
}

/// Same line, clear of the origin so only deliberate sentinels count as occluded.
fn shifted_horizontal() -> Vec<Point> {
    (0..16).map(|i| Point::new(i as f64 + 1.0, 0.5, 0.0)).collect()
}

fn vertical() -> Vec<Point> {
    (0..16).map(|i| Point::new(0.0, i as f64, 0.0)).collect()
}

fn template_of(name: &str, points: &[Point], matcher: &GestureMatcher) -> GestureTemplate {
    GestureTemplate::from_history(
        name,
        &history_of(points),
        &BTreeSet::from([ID]),
        matcher.preprocessor(),
    )
}

fn query(history: &LandmarkHistory) -> GestureQuery<'_> {
    GestureQuery {
        history,
        pose_at_start: None,
        pose_at_end: None,
    }
}

#[test]
fn test_identical_line_is_accepted() {
    let matcher = matcher();
    let template = template_of("line", &horizontal(), &matcher);
    let live = history_of(&horizontal());
    let result = matcher.best_match([&template], &query(&live)).unwrap();
    assert_eq!(result.template_name, "line");
    assert!(result.score.abs() < 1e-12);
}

#[test]
fn test_perpendicular_line_is_rejected() {
    let matcher = matcher();
    let template = template_of("line", &horizontal(), &matcher);
    let live = history_of(&vertical());
    assert!(matcher.best_match([&template], &query(&live)).is_none());

    let processed = BTreeMap::from([(ID, matcher.preprocessor().process(&vertical()))]);
    let distance = matcher.aggregate_distance(&template, &processed).unwrap();
    assert!(distance > 10.0 * matcher.threshold_for(&template));
}

#[test]
fn test_occlusion_gate_overrides_distance() {
    let matcher = matcher();
    let mut points = shifted_horizontal();
    for p in points.iter_mut().take(9) {
        *p = SENTINEL;
    }
    // the template is built from the very same window, so the distance would be zero
    let template = template_of("line", &points, &matcher);
    let live = history_of(&points);
    assert!(matcher.is_occluded(&live, ID));
    assert!(matcher.best_match([&template], &query(&live)).is_none());
}

#[test]
fn test_half_occluded_window_is_still_tracked() {
    let matcher = matcher();
    let mut points = shifted_horizontal();
    for p in points.iter_mut().skip(8) {
        *p = SENTINEL;
    }
    let template = template_of("line", &points, &matcher);
    let live = history_of(&points);
    assert!(!matcher.is_occluded(&live, ID));
    assert!(matcher.best_match([&template], &query(&live)).is_some());
}

#[test]
fn test_threshold_scales_with_point_count() {
    let matcher = matcher();
    let template = GestureTemplate::new(
        "two",
        BTreeMap::from([
            (1, vec![Point::ZERO, Point::X]),
            (2, vec![Point::ZERO, Point::Y, Point::X]),
        ]),
    );
    assert_eq!(template.point_count(), 5);
    assert!((matcher.threshold_for(&template) - 0.82).abs() < 1e-12);
}

#[test]
fn test_lowest_distance_wins() {
    let matcher = matcher();
    let exact = template_of("exact", &horizontal(), &matcher);
    let mut near = exact.clone();
    near.name = "near".to_string();
    for p in near.points.get_mut(&ID).unwrap() {
        p.y += 0.05;
    }
    let live = history_of(&horizontal());
    let result = matcher.best_match([&near, &exact], &query(&live)).unwrap();
    assert_eq!(result.template_name, "exact");
}

#[test]
fn test_anchor_gates() {
    let matcher = matcher();
    let template = template_of("line", &horizontal(), &matcher)
        .with_anchors(Some(AnchorPose::Dense(vec![0.0, 1.0])), None);
    let live = history_of(&horizontal());
    let open = vec![0.0, 1.0];
    let closed = vec![1.0, 0.0];

    let q = GestureQuery {
        history: &live,
        pose_at_start: Some(&open),
        pose_at_end: Some(&closed),
    };
    assert!(matcher.best_match([&template], &q).is_some());

    let q = GestureQuery {
        pose_at_start: Some(&closed),
        ..q
    };
    assert!(matcher.best_match([&template], &q).is_none());
    assert!(matcher.best_match([&template], &query(&live)).is_none());

    let strict = template
        .clone()
        .with_anchors(Some(AnchorPose::Dense(open.clone())), Some(AnchorPose::sparse([(1, 1.0)])));
    let q = GestureQuery {
        history: &live,
        pose_at_start: Some(&open),
        pose_at_end: Some(&closed),
    };
    assert!(!matcher.anchors_pass(&strict, &q));
    let q = GestureQuery {
        pose_at_end: Some(&open),
        ..q
    };
    assert!(matcher.anchors_pass(&strict, &q));
}

#[test]
fn test_untracked_template_landmark_is_skipped() {
    let matcher = matcher();
    let foreign = GestureTemplate::new("foreign", BTreeMap::from([(42, horizontal())]));
    let live = history_of(&horizontal());
    assert!(matcher.best_match([&foreign], &query(&live)).is_none());
    assert!(matcher.best_match(Vec::<&GestureTemplate>::new(), &query(&live)).is_none());
}

#[test]
fn test_custom_distance() {
    fn always_far(_: &[Point], _: &[Point]) -> f64 {
        100.0
    }
    let matcher = matcher().with_distance(always_far);
    let template = template_of("line", &horizontal(), &matcher);
    let live = history_of(&horizontal());
    assert!(matcher.best_match([&template], &query(&live)).is_none());
    assert_eq!(dtw_distance(&horizontal(), &horizontal()), 0.0);
}

#[test]
fn test_continuous_templates_keep_history() {
    let matcher = matcher();
    assert!(!matcher.clears_history("double_wave"));
    assert!(matcher.clears_history("swipe_left"));
}
