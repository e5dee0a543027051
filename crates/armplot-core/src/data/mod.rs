//! Data model shared by every pipeline stage
//!
//! Coordinates, gap markers, strokes, arm geometry and the commands sent to
//! the controller. Everything here is plain data; the stages that transform
//! it live in `armplot-geometry`.

pub mod command;
pub mod files;

pub use command::Command;

use crate::error::{Error, FileFormatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Literal text of a gap marker in point files
pub const GAP_TOKEN: &str = "GAP";

/// A planar coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance from the arm base at the origin
    pub fn norm(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Both components are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One position in the merged point stream
///
/// A `Gap` has no coordinate. It marks a pen lift (or lower) between strokes
/// and must never reach geometry or kinematics code as a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathPoint {
    Coord(Point),
    Gap,
}

impl PathPoint {
    /// The coordinate, if this is not a gap
    pub fn coord(&self) -> Option<Point> {
        match self {
            Self::Coord(p) => Some(*p),
            Self::Gap => None,
        }
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, Self::Gap)
    }
}

impl From<Point> for PathPoint {
    fn from(p: Point) -> Self {
        Self::Coord(p)
    }
}

impl fmt::Display for PathPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coord(p) => write!(f, "{}", p),
            Self::Gap => write!(f, "{}", GAP_TOKEN),
        }
    }
}

impl FromStr for PathPoint {
    type Err = String;

    /// Accepts exactly `GAP` or a numeric pair such as `(1.5, -2)`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s == GAP_TOKEN {
            return Ok(Self::Gap);
        }
        let (x, y) = parse_pair(s)?;
        Ok(Self::Coord(Point::new(x, y)))
    }
}

/// Parse `(a, b)` or `a, b` into two finite numbers
pub(crate) fn parse_pair(s: &str) -> std::result::Result<(f64, f64), String> {
    let inner = match (s.strip_prefix('('), s.strip_suffix(')')) {
        (Some(_), Some(_)) if s.len() >= 2 => &s[1..s.len() - 1],
        (None, None) => s,
        _ => return Err("unbalanced parentheses".to_string()),
    };

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(format!("expected two values, found {}", parts.len()));
    }

    let mut values = [0.0f64; 2];
    for (slot, part) in values.iter_mut().zip(&parts) {
        let value: f64 = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
        if !value.is_finite() {
            return Err(format!("'{}' is not finite", part));
        }
        *slot = value;
    }
    Ok((values[0], values[1]))
}

/// One continuous pen-down path
///
/// Never empty and never contains a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    points: Vec<Point>,
}

impl Stroke {
    /// Create a stroke, rejecting an empty point list
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A stroke holds at least one point, so this is always false
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point {
        self.points[0]
    }

    pub fn last(&self) -> Point {
        self.points[self.points.len() - 1]
    }
}

/// Source vertical axis convention
///
/// Supplied explicitly for every input; never guessed from a file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YAxis {
    /// Y grows downward (SVG and most vector formats); flipped on mapping
    #[default]
    Down,
    /// Y grows upward; mapped without flipping
    Up,
}

impl fmt::Display for YAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Down => write!(f, "down"),
            Self::Up => write!(f, "up"),
        }
    }
}

impl FromStr for YAxis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "down" | "flip" | "svg" => Ok(Self::Down),
            "up" | "no-flip" | "noflip" => Ok(Self::Up),
            _ => Err(format!("Unknown Y axis convention: {} (expected down or up)", s)),
        }
    }
}

/// Link lengths of the two-link arm
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmGeometry {
    /// Shoulder-to-elbow length
    pub l1: f64,
    /// Elbow-to-pen length
    pub l2: f64,
}

impl ArmGeometry {
    /// Create arm geometry, rejecting non-positive or non-finite lengths
    pub fn new(l1: f64, l2: f64) -> Result<Self> {
        for (name, value) in [("l1", l1), ("l2", l2)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::invalid_parameter(
                    name,
                    format!("link length must be positive, got {}", value),
                ));
            }
        }
        Ok(Self { l1, l2 })
    }

    /// Outer radius of the reachable annulus
    pub fn max_reach(&self) -> f64 {
        self.l1 + self.l2
    }

    /// Inner radius of the reachable annulus
    pub fn min_reach(&self) -> f64 {
        (self.l1 - self.l2).abs()
    }

    /// Whether a radius lies inside the reachable annulus
    pub fn reaches(&self, r: f64) -> bool {
        r >= self.min_reach() && r <= self.max_reach()
    }
}

/// Parse a single point-file line, attaching its line number on failure
pub fn parse_point_line(line_number: usize, line: &str) -> Result<PathPoint> {
    line.parse::<PathPoint>().map_err(|reason| {
        FileFormatError::InvalidLine {
            line_number,
            content: line.trim().to_string(),
            reason,
        }
        .into()
    })
}
