use crate::types::Point;

/// Dynamic time warping distance with euclidean local cost.
pub fn dtw_distance(a: &[Point], b: &[Point]) -> f64 {
    dtw_distance_by(a, b, |p, q| p.distance(*q))
}

/// Dynamic time warping distance with a caller supplied local cost.
///
/// `D(i, j) = cost(i, j) + min(D(i-1, j), D(i, j-1), D(i-1, j-1))`, with the first row and
/// column accumulated along the boundary. Two empty sequences are at distance zero, an
/// empty and a non-empty one at infinity.
pub fn dtw_distance_by<T, F>(a: &[T], b: &[T], cost: F) -> f64
where
    F: Fn(&T, &T) -> f64,
{
    if a.is_empty() || b.is_empty() {
        return if a.is_empty() && b.is_empty() {
            0.0
        } else {
            f64::INFINITY
        };
    }
    let m = b.len();
    let mut prev = vec![0.0; m];
    let mut curr = vec![0.0; m];

    prev[0] = cost(&a[0], &b[0]);
    for j in 1..m {
        prev[j] = prev[j - 1] + cost(&a[0], &b[j]);
    }
    for ai in &a[1..] {
        curr[0] = prev[0] + cost(ai, &b[0]);
        for j in 1..m {
            let best = prev[j].min(curr[j - 1]).min(prev[j - 1]);
            curr[j] = cost(ai, &b[j]) + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[m - 1]
}
