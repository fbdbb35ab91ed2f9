use landmark_gesture::dtw::{dtw_distance, dtw_distance_by};
use landmark_gesture::types::Point;

fn line(n: usize, step: Point) -> Vec<Point> {
    (0..n).map(|i| step * i as f64).collect()
}

#[test]
fn test_identical_sequences_are_zero() {
    let a = line(16, Point::X);
    assert_eq!(dtw_distance(&a, &a), 0.0);
}

#[test]
fn test_symmetric() {
    let a: Vec<Point> = (0..9)
        .map(|i| Point::new((i as f64).sin(), (i as f64 * 0.5).cos(), 0.0))
        .collect();
    let b: Vec<Point> = (0..14)
        .map(|i| Point::new((i as f64 * 0.8).cos(), i as f64 * 0.1, 0.0))
        .collect();
    assert_eq!(dtw_distance(&a, &b), dtw_distance(&b, &a));
}

#[test]
fn test_tolerates_repeated_samples() {
    let a = vec![Point::ZERO, Point::X, Point::X * 2.0];
    let b = vec![Point::ZERO, Point::ZERO, Point::X, Point::X, Point::X * 2.0];
    assert_eq!(dtw_distance(&a, &b), 0.0);
}

#[test]
fn test_known_value() {
    // 1-D: [0, 1, 2] against [0, 2]
    let d = dtw_distance_by(&[0.0, 1.0, 2.0], &[0.0, 2.0], |a: &f64, b: &f64| (a - b).abs());
    assert!((d - 1.0).abs() < 1e-12);
}

#[test]
fn test_empty_sequences() {
    let a = line(3, Point::Y);
    assert_eq!(dtw_distance(&[], &[]), 0.0);
    assert!(dtw_distance(&a, &[]).is_infinite());
    assert!(dtw_distance(&[], &a).is_infinite());
}

#[test]
fn test_perpendicular_lines_are_far() {
    let horizontal = line(16, Point::X);
    let vertical = line(16, Point::Y);
    assert!(dtw_distance(&horizontal, &vertical) > 10.0);
}
