//! Parametric path segments
//!
//! Thin wrapper over lyon's f64 segment types so the extractor can ask any
//! segment for its endpoints and a point at parameter `t`.

use armplot_core::Point;
use lyon::geom::{self, CubicBezierSegment, LineSegment, QuadraticBezierSegment, Transform};

/// One parametric piece of a source path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(LineSegment<f64>),
    Quadratic(QuadraticBezierSegment<f64>),
    Cubic(CubicBezierSegment<f64>),
}

/// All segments of one source path, in drawing order
pub type SourcePath = Vec<Segment>;

fn to_geom(p: Point) -> geom::Point<f64> {
    geom::point(p.x, p.y)
}

fn from_geom(p: geom::Point<f64>) -> Point {
    Point::new(p.x, p.y)
}

impl Segment {
    /// Straight segment
    pub fn line(from: Point, to: Point) -> Self {
        Self::Line(LineSegment {
            from: to_geom(from),
            to: to_geom(to),
        })
    }

    /// Quadratic Bézier segment
    pub fn quadratic(from: Point, ctrl: Point, to: Point) -> Self {
        Self::Quadratic(QuadraticBezierSegment {
            from: to_geom(from),
            ctrl: to_geom(ctrl),
            to: to_geom(to),
        })
    }

    /// Cubic Bézier segment
    pub fn cubic(from: Point, ctrl1: Point, ctrl2: Point, to: Point) -> Self {
        Self::Cubic(CubicBezierSegment {
            from: to_geom(from),
            ctrl1: to_geom(ctrl1),
            ctrl2: to_geom(ctrl2),
            to: to_geom(to),
        })
    }

    pub fn start(&self) -> Point {
        match self {
            Self::Line(s) => from_geom(s.from),
            Self::Quadratic(s) => from_geom(s.from),
            Self::Cubic(s) => from_geom(s.from),
        }
    }

    pub fn end(&self) -> Point {
        match self {
            Self::Line(s) => from_geom(s.to),
            Self::Quadratic(s) => from_geom(s.to),
            Self::Cubic(s) => from_geom(s.to),
        }
    }

    /// Evaluate the segment at `t` in `[0, 1]`
    pub fn sample(&self, t: f64) -> Point {
        match self {
            Self::Line(s) => from_geom(s.sample(t)),
            Self::Quadratic(s) => from_geom(s.sample(t)),
            Self::Cubic(s) => from_geom(s.sample(t)),
        }
    }

    /// Apply an affine transform to every control point
    pub fn transformed(&self, transform: &Transform<f64>) -> Self {
        match self {
            Self::Line(s) => Self::Line(s.transformed(transform)),
            Self::Quadratic(s) => Self::Quadratic(s.transformed(transform)),
            Self::Cubic(s) => Self::Cubic(s.transformed(transform)),
        }
    }
}
