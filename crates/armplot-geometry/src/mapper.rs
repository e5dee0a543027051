//! Workspace mapping
//!
//! Places a drawing inside the arm's reach. The whole drawing is scaled
//! uniformly (aspect ratio preserved) and translated so its bounding box
//! starts at `(margin, margin)`. The scale is chosen so that no mapped point
//! lies farther than `L1 + L2 - margin` from the arm base.
//!
//! The mapper also owns the gap structure of the merged point stream: one gap
//! between strokes when joining, then a second gap after the first point of
//! each following stroke so that travel happens pen-up.

use armplot_core::{ArmGeometry, Error, PathPoint, Point, Result, Stroke, YAxis};

/// Axis-aligned bounds of the real coordinates in a point stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of all non-gap points, or `None` if there are none
    pub fn of(points: &[PathPoint]) -> Option<Self> {
        points.iter().filter_map(PathPoint::coord).fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }
}

/// Flatten strokes into one stream with a single gap between strokes
pub fn join_strokes(strokes: &[Stroke]) -> Vec<PathPoint> {
    let mut out = Vec::with_capacity(strokes.iter().map(|s| s.len() + 1).sum());
    for (index, stroke) in strokes.iter().enumerate() {
        if index > 0 {
            out.push(PathPoint::Gap);
        }
        out.extend(stroke.points().iter().copied().map(PathPoint::Coord));
    }
    out
}

/// Room left for the drawing's diagonal once the margin offset is placed
fn reach_budget(arm: &ArmGeometry, margin: f64) -> f64 {
    arm.max_reach() - margin - margin * std::f64::consts::SQRT_2
}

/// Check a margin against the arm's reach
pub fn validate_margin(arm: &ArmGeometry, margin: f64) -> Result<()> {
    if !margin.is_finite() || margin < 0.0 {
        return Err(Error::invalid_parameter(
            "margin",
            format!("must be a non-negative number, got {}", margin),
        ));
    }
    if reach_budget(arm, margin) <= 0.0 {
        return Err(Error::invalid_parameter(
            "margin",
            format!(
                "margin {} leaves no drawable area within reach {}",
                margin,
                arm.max_reach()
            ),
        ));
    }
    Ok(())
}

/// Scale and translate all real coordinates into the arm's workspace
///
/// Gaps pass through untouched. When every point coincides the scale is 1
/// and only the margin translation is applied.
pub fn fit_to_workspace(
    points: &[PathPoint],
    arm: &ArmGeometry,
    margin: f64,
    y_axis: YAxis,
) -> Result<Vec<PathPoint>> {
    validate_margin(arm, margin)?;

    let Some(bounds) = Bounds::of(points) else {
        return Ok(points.to_vec());
    };

    let diagonal = bounds.diagonal();
    let scale = if diagonal > 0.0 {
        reach_budget(arm, margin) / diagonal
    } else {
        1.0
    };

    tracing::debug!(
        "Fitting {:.3}x{:.3} drawing with scale {:.5} (y axis {})",
        bounds.width(),
        bounds.height(),
        scale,
        y_axis
    );

    let map = |p: Point| {
        let x = margin + (p.x - bounds.min_x) * scale;
        let y = match y_axis {
            YAxis::Down => margin + (bounds.max_y - p.y) * scale,
            YAxis::Up => margin + (p.y - bounds.min_y) * scale,
        };
        Point::new(x, y)
    };

    Ok(points
        .iter()
        .map(|pp| match pp {
            PathPoint::Coord(p) => PathPoint::Coord(map(*p)),
            PathPoint::Gap => PathPoint::Gap,
        })
        .collect())
}

/// Give every stroke-to-stroke transition its own lift/lower pair
///
/// `a, Gap, b0, b1` becomes `a, Gap, b0, Gap, b1`: the pen lifts, travels to
/// the next stroke's first point, then lowers. Gaps not followed by a
/// coordinate are copied as they are.
///
/// A single-point stroke followed by another transition produces two
/// adjacent gaps: the pen lowers at that point and lifts straight away,
/// leaving a dot.
pub fn bracket_transitions(points: &[PathPoint]) -> Vec<PathPoint> {
    let mut out = Vec::with_capacity(points.len() + points.len() / 2);
    let mut iter = points.iter().copied().peekable();
    while let Some(pp) = iter.next() {
        out.push(pp);
        if pp.is_gap() {
            if let Some(PathPoint::Coord(first)) = iter.peek().copied() {
                iter.next();
                out.push(PathPoint::Coord(first));
                out.push(PathPoint::Gap);
            }
        }
    }
    out
}

/// Mapping stage configuration bundled for the pipeline
#[derive(Debug, Clone, Copy)]
pub struct WorkspaceMapper {
    arm: ArmGeometry,
    margin: f64,
}

impl WorkspaceMapper {
    pub fn new(arm: ArmGeometry, margin: f64) -> Result<Self> {
        validate_margin(&arm, margin)?;
        Ok(Self { arm, margin })
    }

    /// Join, fit and bracket a set of strokes
    pub fn map(&self, strokes: &[Stroke], y_axis: YAxis) -> Result<Vec<PathPoint>> {
        let joined = join_strokes(strokes);
        let fitted = fit_to_workspace(&joined, &self.arm, self.margin, y_axis)?;
        Ok(bracket_transitions(&fitted))
    }
}
