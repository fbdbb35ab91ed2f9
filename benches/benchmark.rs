use std::collections::BTreeSet;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use landmark_gesture::config::{EngineConfig, TrajectoryConfig};
use landmark_gesture::dtw::dtw_distance;
use landmark_gesture::gesture::{GestureMatcher, GestureQuery};
use landmark_gesture::history::LandmarkHistory;
use landmark_gesture::pose::PoseMatcher;
use landmark_gesture::synthetic::{Shape, SyntheticSpec, synthesize_recording};
use landmark_gesture::template::GestureTemplate;
use landmark_gesture::trajectory::{TrajectoryPreprocessor, process_landmarks};
use landmark_gesture::types::Point;

fn wave_window(n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let t = i as f64 / n as f64;
            Point::new(t, (t * 12.0).sin() * 0.3, 0.0)
        })
        .collect()
}

fn bench_dtw(c: &mut Criterion) {
    let a = wave_window(64);
    let b: Vec<Point> = wave_window(80).iter().map(|p| *p * 1.1).collect();
    c.bench_function("dtw_64x80", |bench| {
        bench.iter(|| dtw_distance(black_box(&a), black_box(&b)))
    });
}

fn bench_preprocess(c: &mut Criterion) {
    let preprocessor = TrajectoryPreprocessor::from_config(&TrajectoryConfig::default()).unwrap();
    let raw = wave_window(25);
    c.bench_function("preprocess_window_25", |b| {
        b.iter(|| preprocessor.process(black_box(&raw)))
    });
}

fn bench_gesture_match(c: &mut Criterion) {
    let config = EngineConfig::default();
    let preprocessor = TrajectoryPreprocessor::from_config(&config.trajectory).unwrap();
    let spec = SyntheticSpec::new(Shape::Wave, config.window_len);
    let recording = synthesize_recording(&spec, 7);
    let mut history = LandmarkHistory::new(&config.topology, config.window_len);
    for frame in recording.frames.iter().flatten() {
        history.push_frame(frame, config.visibility_floor, config.dimension);
    }
    let selection: BTreeSet<usize> = [15].into_iter().collect();
    let templates: Vec<GestureTemplate> = (0..10)
        .map(|i| {
            GestureTemplate::new(
                format!("wave_{}", i),
                process_landmarks(&history, &selection, &preprocessor),
            )
        })
        .collect();
    let matcher = GestureMatcher::new(config.gesture.clone(), preprocessor, PoseMatcher::default());
    let query = GestureQuery {
        history: &history,
        pose_at_start: None,
        pose_at_end: None,
    };
    c.bench_function("gesture_match_10_templates", |b| {
        b.iter(|| matcher.best_match(black_box(&templates), &query))
    });
}

criterion_group!(benches, bench_dtw, bench_preprocess, bench_gesture_match);
criterion_main!(benches);
