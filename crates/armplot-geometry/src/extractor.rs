//! Geometry extraction
//!
//! Samples source path segments into strokes. A stroke ends wherever a
//! segment does not start where the previous one ended, which is how the
//! artwork encodes a pen lift inside a single path.

use crate::segment::{Segment, SourcePath};
use armplot_core::{Error, GeometryError, Point, Result, Stroke};

/// Relative tolerance for deciding two segment endpoints are the same point
const CONTIGUITY_EPSILON: f64 = 1e-9;

fn contiguous(a: Point, b: Point) -> bool {
    let scale = 1.0f64.max(a.norm()).max(b.norm());
    (a.x - b.x).abs() <= CONTIGUITY_EPSILON * scale
        && (a.y - b.y).abs() <= CONTIGUITY_EPSILON * scale
}

/// Turn source paths into strokes
///
/// Each segment contributes `samples_per_segment` evenly spaced samples
/// starting at `t = 0`; every stroke is closed with the exact end point of
/// its last segment. A non-finite sample aborts extraction.
pub fn extract_strokes(paths: &[SourcePath], samples_per_segment: usize) -> Result<Vec<Stroke>> {
    if samples_per_segment == 0 {
        return Err(Error::invalid_parameter(
            "samples_per_segment",
            "must be at least 1",
        ));
    }

    let mut strokes = Vec::new();

    for (path_index, path) in paths.iter().enumerate() {
        let mut current: Vec<Point> = Vec::new();
        let mut previous: Option<(usize, &Segment)> = None;

        for (segment_index, segment) in path.iter().enumerate() {
            if let Some((prev_index, prev)) = previous {
                if !contiguous(prev.end(), segment.start()) {
                    close_stroke(&mut strokes, &mut current, path_index, prev_index, prev)?;
                }
            }

            for i in 0..samples_per_segment {
                let t = i as f64 / samples_per_segment as f64;
                let p = segment.sample(t);
                if !p.is_finite() {
                    return Err(GeometryError::MalformedSegment {
                        path: path_index,
                        segment: segment_index,
                        reason: format!("non-finite sample at t = {}", t),
                    }
                    .into());
                }
                current.push(p);
            }

            previous = Some((segment_index, segment));
        }

        if let Some((prev_index, prev)) = previous {
            close_stroke(&mut strokes, &mut current, path_index, prev_index, prev)?;
        }
    }

    tracing::debug!(
        "Extracted {} strokes from {} paths",
        strokes.len(),
        paths.len()
    );
    Ok(strokes)
}

fn close_stroke(
    strokes: &mut Vec<Stroke>,
    current: &mut Vec<Point>,
    path_index: usize,
    segment_index: usize,
    last: &Segment,
) -> Result<()> {
    let end = last.end();
    if !end.is_finite() {
        return Err(GeometryError::MalformedSegment {
            path: path_index,
            segment: segment_index,
            reason: "non-finite end point".to_string(),
        }
        .into());
    }
    current.push(end);
    if let Some(stroke) = Stroke::new(std::mem::take(current)) {
        strokes.push(stroke);
    }
    Ok(())
}
