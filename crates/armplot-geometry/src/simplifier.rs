//! Polyline simplification (Douglas–Peucker)
//!
//! Reduces a densely sampled stroke to the points that matter at a given
//! tolerance. The same tolerance is applied to every stroke of every input so
//! node counts stay comparable between drawings.

use armplot_core::{Point, Stroke};

/// Perpendicular distance from `p` to the line through `a` and `b`
///
/// Falls back to the distance to `a` when the chord has no length.
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = dx.hypot(dy);
    if len == 0.0 {
        return p.distance_to(&a);
    }
    ((p.x - a.x) * dy - (p.y - a.y) * dx).abs() / len
}

/// Simplify a polyline with tolerance `epsilon`
///
/// The first and last points are always kept. Inputs of fewer than three
/// points come back unchanged. A negative tolerance behaves like zero.
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }
    let epsilon = epsilon.max(0.0);

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut spans = vec![(0usize, points.len() - 1)];
    while let Some((first, last)) = spans.pop() {
        if last <= first + 1 {
            continue;
        }

        let (a, b) = (points[first], points[last]);
        let mut max_distance = 0.0;
        let mut split = first;
        for (offset, p) in points[first + 1..last].iter().enumerate() {
            let d = perpendicular_distance(*p, a, b);
            if d > max_distance {
                max_distance = d;
                split = first + 1 + offset;
            }
        }

        if max_distance > epsilon {
            keep[split] = true;
            spans.push((first, split));
            spans.push((split, last));
        }
    }

    points
        .iter()
        .zip(keep)
        .filter_map(|(p, k)| k.then_some(*p))
        .collect()
}

/// Simplify a stroke; a stroke stays non-empty
pub fn simplify_stroke(stroke: &Stroke, epsilon: f64) -> Stroke {
    match Stroke::new(simplify(stroke.points(), epsilon)) {
        Some(s) => s,
        None => stroke.clone(),
    }
}
