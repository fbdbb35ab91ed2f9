use landmark_gesture::config::TrajectoryConfig;
use landmark_gesture::trajectory::{
    SavitzkyGolay, TrajectoryPreprocessor, gaussian_filter, gaussian_kernel, perpendicular_distance,
    recenter, simplify,
};
use landmark_gesture::types::Point;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn random_walk(n: usize, seed: u64) -> Vec<Point> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut p = Point::ZERO;
    (0..n)
        .map(|_| {
            p += Point::new(rng.random_range(-0.05..0.05), rng.random_range(-0.05..0.05), 0.0);
            p
        })
        .collect()
}

#[test]
fn test_gaussian_kernel() {
    let kernel = gaussian_kernel(2.0);
    let sum: f64 = kernel.iter().sum();
    assert!((sum - 1.0).abs() < 1e-12);
    for k in 0..3 {
        assert!((kernel[k] - kernel[6 - k]).abs() < 1e-15);
        assert!(kernel[k] < kernel[k + 1]);
    }
}

#[test]
fn test_gaussian_filter_keeps_constant_and_length() {
    let points = vec![Point::new(0.3, -0.2, 0.0); 5];
    let smoothed = gaussian_filter(&points, 2.0);
    assert_eq!(smoothed.len(), 5);
    for p in smoothed {
        assert!(p.distance(Point::new(0.3, -0.2, 0.0)) < 1e-12);
    }
}

#[test]
fn test_gaussian_filter_pulls_ramp_ends_inward() {
    let ramp: Vec<Point> = (0..10).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
    let smoothed = gaussian_filter(&ramp, 2.0);
    assert!(smoothed[0].x > 0.0);
    assert!(smoothed[9].x < 9.0);
    // interior samples of a ramp are untouched by a symmetric kernel
    assert!((smoothed[5].x - 5.0).abs() < 1e-12);
}

#[test]
fn test_recenter() {
    let points = vec![Point::new(1.0, 2.0, 0.0), Point::new(3.0, 4.0, 0.0)];
    let centered = recenter(&points);
    assert_eq!(centered[0], Point::new(-1.0, -1.0, 0.0));
    assert_eq!(centered[1], Point::new(1.0, 1.0, 0.0));
}

#[test]
fn test_savgol_coefficients_sum_to_one() {
    let sg = SavitzkyGolay::new(8, 3).unwrap();
    assert_eq!(sg.coefficients().len(), 8);
    let sum: f64 = sg.coefficients().iter().sum();
    assert!((sum - 1.0).abs() < 1e-9);
}

#[test]
fn test_savgol_reproduces_cubic_in_interior() {
    let cubic = |t: f64| 0.01 * t * t * t - 0.2 * t * t + t;
    let points: Vec<Point> = (0..20)
        .map(|i| Point::new(cubic(i as f64), -cubic(i as f64), 0.0))
        .collect();
    let fitted = SavitzkyGolay::new(8, 3).unwrap().apply(&points);
    for i in 4..=16 {
        assert!(
            fitted[i].distance(points[i]) < 1e-8,
            "sample {} moved to {:?}",
            i,
            fitted[i]
        );
    }
}

#[test]
fn test_savgol_even_window_reads_on_sample() {
    // offsets -4..=3 are not symmetric about the evaluation point
    let even = SavitzkyGolay::new(8, 3).unwrap();
    let c = even.coefficients();
    assert!((c[0] - c[7]).abs() > 1e-6);

    let odd = SavitzkyGolay::new(7, 3).unwrap();
    let c = odd.coefficients();
    for k in 0..3 {
        assert!((c[k] - c[6 - k]).abs() < 1e-9);
    }
}

#[test]
fn test_savgol_rejects_short_window() {
    assert!(SavitzkyGolay::new(3, 3).is_err());
    assert!(SavitzkyGolay::new(4, 3).is_ok());
}

#[test]
fn test_perpendicular_distance() {
    let start = Point::new(0.0, 0.0, 0.0);
    let end = Point::new(4.0, 0.0, 0.0);
    assert!((perpendicular_distance(&Point::new(2.0, 3.0, 0.0), &start, &end) - 3.0).abs() < 1e-12);
    // coinciding endpoints fall back to point distance
    let far = Point::new(3.0, 4.0, 0.0);
    assert!((perpendicular_distance(&far, &start, &start) - 5.0).abs() < 1e-12);
}

#[test]
fn test_simplify_collinear_collapses_to_endpoints() {
    let line: Vec<Point> = (0..16).map(|i| Point::new(i as f64, 0.0, 0.0)).collect();
    let simplified = simplify(&line, 0.01);
    assert_eq!(simplified, vec![line[0], line[15]]);
}

#[test]
fn test_simplify_short_input_unchanged() {
    let two = vec![Point::ZERO, Point::ONE];
    assert_eq!(simplify(&two, 10.0), two);
    assert!(simplify(&[], 0.01).is_empty());
}

#[test]
fn test_simplify_keeps_corner() {
    let corner = vec![
        Point::new(0.0, 0.0, 0.0),
        Point::new(1.0, 0.0, 0.0),
        Point::new(2.0, 0.0, 0.0),
        Point::new(2.0, 1.0, 0.0),
        Point::new(2.0, 2.0, 0.0),
    ];
    let simplified = simplify(&corner, 0.01);
    assert_eq!(simplified, vec![corner[0], corner[2], corner[4]]);
}

#[test]
fn test_simplify_is_idempotent() {
    for seed in 0..20 {
        let points = random_walk(40, seed);
        for tolerance in [0.001, 0.007, 0.01, 0.05] {
            let once = simplify(&points, tolerance);
            let twice = simplify(&once, tolerance);
            assert_eq!(once, twice, "seed {} tolerance {}", seed, tolerance);
        }
    }
}

#[test]
fn test_process_output_is_shorter_and_translation_free() {
    let preprocessor = TrajectoryPreprocessor::from_config(&TrajectoryConfig::default()).unwrap();
    let points: Vec<Point> = (0..25)
        .map(|i| {
            let t = i as f64 / 24.0;
            Point::new((6.0 * t).sin() * 0.3, t * 0.5, 0.0)
        })
        .collect();
    let shifted: Vec<Point> = points.iter().map(|p| *p + Point::new(0.4, 0.2, 0.0)).collect();
    let a = preprocessor.process(&points);
    let b = preprocessor.process(&shifted);
    assert!(a.len() <= points.len());
    assert!(a.len() >= 2);
    assert_eq!(a.len(), b.len());
    for (p, q) in a.iter().zip(&b) {
        assert!(p.distance(*q) < 1e-9);
    }
    assert!(preprocessor.process(&[]).is_empty());
}

#[test]
fn test_preprocessor_rejects_bad_config() {
    let config = TrajectoryConfig {
        savgol_window: 2,
        ..Default::default()
    };
    assert!(TrajectoryPreprocessor::from_config(&config).is_err());
}
