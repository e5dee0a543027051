//! SVG path reading
//!
//! Pulls drawable geometry out of an SVG document as source paths for the
//! extractor. Handles `<path d="…">` (all absolute and relative commands,
//! arcs converted to cubic Béziers), `<line>`, `<polyline>` and `<polygon>`.
//! The first group `matrix(…)` transform, if any, is applied to everything.
//!
//! Unlike a viewer, this reader is strict: a malformed number or a command
//! with missing arguments rejects the whole document.

use crate::segment::{Segment, SourcePath};
use armplot_core::{GeometryError, Point, Result};
use lyon::geom::{self, Angle, ArcFlags, SvgArc, Transform};
use regex::Regex;
use std::path::Path as StdPath;

fn invalid(reason: impl Into<String>) -> GeometryError {
    GeometryError::InvalidSvg {
        reason: reason.into(),
    }
}

/// Token of SVG path data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathToken {
    Command(char),
    Number(f64),
}

/// Split path data into commands and numbers
///
/// Understands the compact forms `10-5`, `.5.5` and exponents like `1e-3`.
pub fn tokenize_path_data(data: &str) -> Result<Vec<PathToken>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = data.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            'M' | 'm' | 'L' | 'l' | 'H' | 'h' | 'V' | 'v' | 'C' | 'c' | 'S' | 's' | 'Q'
            | 'q' | 'T' | 't' | 'A' | 'a' | 'Z' | 'z' => {
                tokens.push(PathToken::Command(ch));
                i += 1;
            }
            ' ' | ',' | '\n' | '\r' | '\t' => i += 1,
            '-' | '+' | '.' | '0'..='9' => {
                let start = i;
                let mut seen_dot = false;
                let mut seen_exp = false;
                if ch == '-' || ch == '+' {
                    i += 1;
                }
                while i < chars.len() {
                    let c = chars[i];
                    if c.is_ascii_digit() {
                        i += 1;
                    } else if c == '.' && !seen_dot && !seen_exp {
                        seen_dot = true;
                        i += 1;
                    } else if (c == 'e' || c == 'E') && !seen_exp {
                        seen_exp = true;
                        i += 1;
                        if i < chars.len() && (chars[i] == '-' || chars[i] == '+') {
                            i += 1;
                        }
                    } else {
                        break;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value: f64 = text
                    .parse()
                    .map_err(|_| invalid(format!("bad number '{}' in path data", text)))?;
                tokens.push(PathToken::Number(value));
            }
            other => return Err(invalid(format!("unexpected character '{}' in path data", other)).into()),
        }
    }

    Ok(tokens)
}

/// Builds segments for one `<path>` while tracking SVG pen state
struct PathBuilder {
    segments: Vec<Segment>,
    current: Point,
    subpath_start: Point,
    last_cubic_ctrl: Option<Point>,
    last_quad_ctrl: Option<Point>,
}

impl PathBuilder {
    fn new() -> Self {
        Self {
            segments: Vec::new(),
            current: Point::default(),
            subpath_start: Point::default(),
            last_cubic_ctrl: None,
            last_quad_ctrl: None,
        }
    }

    fn move_to(&mut self, to: Point) {
        self.current = to;
        self.subpath_start = to;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn line_to(&mut self, to: Point) {
        self.segments.push(Segment::line(self.current, to));
        self.current = to;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn cubic_to(&mut self, ctrl1: Point, ctrl2: Point, to: Point) {
        self.segments
            .push(Segment::cubic(self.current, ctrl1, ctrl2, to));
        self.current = to;
        self.last_cubic_ctrl = Some(ctrl2);
        self.last_quad_ctrl = None;
    }

    fn quadratic_to(&mut self, ctrl: Point, to: Point) {
        self.segments.push(Segment::quadratic(self.current, ctrl, to));
        self.current = to;
        self.last_quad_ctrl = Some(ctrl);
        self.last_cubic_ctrl = None;
    }

    fn arc_to(&mut self, radii: (f64, f64), x_rotation: f64, large_arc: bool, sweep: bool, to: Point) {
        let arc = SvgArc {
            from: geom::point(self.current.x, self.current.y),
            to: geom::point(to.x, to.y),
            radii: geom::vector(radii.0.abs(), radii.1.abs()),
            x_rotation: Angle::degrees(x_rotation),
            flags: ArcFlags { large_arc, sweep },
        };
        if arc.is_straight_line() {
            self.line_to(to);
            return;
        }
        let mut cubics = Vec::new();
        arc.to_arc().for_each_cubic_bezier(&mut |c| cubics.push(*c));
        for c in cubics {
            self.segments.push(Segment::Cubic(c));
        }
        self.current = to;
        self.last_cubic_ctrl = None;
        self.last_quad_ctrl = None;
    }

    fn close(&mut self) {
        if self.current != self.subpath_start {
            self.line_to(self.subpath_start);
        }
        self.current = self.subpath_start;
    }

    /// Mirror of the previous control point, or the current point
    fn reflect(&self, ctrl: Option<Point>) -> Point {
        match ctrl {
            Some(c) => Point::new(2.0 * self.current.x - c.x, 2.0 * self.current.y - c.y),
            None => self.current,
        }
    }
}

/// Cursor over path tokens that reads command arguments
struct Args<'a> {
    tokens: &'a [PathToken],
    pos: usize,
}

impl<'a> Args<'a> {
    fn next_number(&mut self, command: char) -> Result<f64> {
        match self.tokens.get(self.pos) {
            Some(PathToken::Number(v)) => {
                self.pos += 1;
                Ok(*v)
            }
            _ => Err(invalid(format!("missing argument for '{}' command", command)).into()),
        }
    }

    fn has_number(&self) -> bool {
        matches!(self.tokens.get(self.pos), Some(PathToken::Number(_)))
    }

    fn point(&mut self, command: char, origin: Point) -> Result<Point> {
        let x = self.next_number(command)?;
        let y = self.next_number(command)?;
        Ok(Point::new(origin.x + x, origin.y + y))
    }

    fn flag(&mut self, command: char) -> Result<bool> {
        let v = self.next_number(command)?;
        if v == 0.0 {
            Ok(false)
        } else if v == 1.0 {
            Ok(true)
        } else {
            Err(invalid(format!("arc flag must be 0 or 1, got {}", v)).into())
        }
    }
}

/// Convert `d` attribute data into segments
pub fn parse_path_data(data: &str) -> Result<SourcePath> {
    let tokens = tokenize_path_data(data)?;
    let mut builder = PathBuilder::new();
    let mut args = Args {
        tokens: &tokens,
        pos: 0,
    };

    while args.pos < tokens.len() {
        let command = match tokens[args.pos] {
            PathToken::Command(c) => c,
            PathToken::Number(v) => {
                return Err(invalid(format!("number {} without a command", v)).into())
            }
        };
        args.pos += 1;

        let relative = command.is_ascii_lowercase();
        let mut first = true;

        // Commands repeat while numbers follow; Z takes none.
        loop {
            let origin = if relative {
                builder.current
            } else {
                Point::default()
            };
            match command.to_ascii_uppercase() {
                'M' => {
                    let p = args.point(command, origin)?;
                    if first {
                        builder.move_to(p);
                    } else {
                        builder.line_to(p);
                    }
                }
                'L' => {
                    let p = args.point(command, origin)?;
                    builder.line_to(p);
                }
                'H' => {
                    let x = args.next_number(command)?;
                    let x = if relative { builder.current.x + x } else { x };
                    builder.line_to(Point::new(x, builder.current.y));
                }
                'V' => {
                    let y = args.next_number(command)?;
                    let y = if relative { builder.current.y + y } else { y };
                    builder.line_to(Point::new(builder.current.x, y));
                }
                'C' => {
                    let c1 = args.point(command, origin)?;
                    let c2 = args.point(command, origin)?;
                    let to = args.point(command, origin)?;
                    builder.cubic_to(c1, c2, to);
                }
                'S' => {
                    let c1 = builder.reflect(builder.last_cubic_ctrl);
                    let c2 = args.point(command, origin)?;
                    let to = args.point(command, origin)?;
                    builder.cubic_to(c1, c2, to);
                }
                'Q' => {
                    let ctrl = args.point(command, origin)?;
                    let to = args.point(command, origin)?;
                    builder.quadratic_to(ctrl, to);
                }
                'T' => {
                    let ctrl = builder.reflect(builder.last_quad_ctrl);
                    let to = args.point(command, origin)?;
                    builder.quadratic_to(ctrl, to);
                }
                'A' => {
                    let rx = args.next_number(command)?;
                    let ry = args.next_number(command)?;
                    let rotation = args.next_number(command)?;
                    let large_arc = args.flag(command)?;
                    let sweep = args.flag(command)?;
                    let to = args.point(command, origin)?;
                    builder.arc_to((rx, ry), rotation, large_arc, sweep, to);
                }
                'Z' => {
                    builder.close();
                    break;
                }
                other => return Err(invalid(format!("unsupported path command '{}'", other)).into()),
            }
            first = false;
            if !args.has_number() {
                break;
            }
        }
    }

    Ok(builder.segments)
}

/// Parse an SVG `matrix(a,b,c,d,e,f)` transform
fn parse_matrix_transform(transform: &str) -> Option<Transform<f64>> {
    let inner = transform.trim().strip_prefix("matrix(")?.strip_suffix(')')?;
    let values: Vec<f64> = inner
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<std::result::Result<_, _>>()
        .ok()?;
    match values[..] {
        [a, b, c, d, e, f] => Some(Transform::new(a, b, c, d, e, f)),
        _ => None,
    }
}

fn attribute<'t>(attrs: &'t str, name: &str) -> Option<&'t str> {
    let re = Regex::new(&format!(r#"(?:^|\s){}\s*=\s*["']([^"']*)["']"#, name)).ok()?;
    re.captures(attrs)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn numeric_attribute(attrs: &str, name: &str, element: &str) -> Result<f64> {
    let raw = attribute(attrs, name)
        .ok_or_else(|| invalid(format!("<{}> is missing '{}'", element, name)))?;
    raw.trim()
        .parse()
        .map_err(|_| invalid(format!("<{}> has bad '{}' value '{}'", element, name, raw)).into())
}

fn parse_point_list(points: &str) -> Result<Vec<Point>> {
    let numbers: Vec<f64> = tokenize_path_data(points)?
        .into_iter()
        .map(|t| match t {
            PathToken::Number(v) => Ok(v),
            PathToken::Command(c) => Err(invalid(format!("unexpected '{}' in points list", c))),
        })
        .collect::<std::result::Result<_, _>>()?;
    if numbers.len() % 2 != 0 {
        return Err(invalid("points list has an odd number of values").into());
    }
    Ok(numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect())
}

fn polyline(points: &[Point], closed: bool) -> SourcePath {
    let mut segments: SourcePath = points
        .windows(2)
        .map(|w| Segment::line(w[0], w[1]))
        .collect();
    if closed && points.len() > 2 {
        segments.push(Segment::line(points[points.len() - 1], points[0]));
    }
    segments
}

/// Extract source paths from SVG text
pub fn parse_svg(content: &str) -> Result<Vec<SourcePath>> {
    if !content.contains("<svg") {
        return Err(invalid("no <svg> element").into());
    }

    let group_transform = Regex::new(r#"<g\s+([^>]+)>"#)
        .map_err(|e| invalid(e.to_string()))?
        .captures(content)
        .and_then(|caps| attribute(caps.get(1)?.as_str(), "transform"))
        .and_then(parse_matrix_transform);

    let element_re = Regex::new(r#"<(path|line|polyline|polygon)\s+([^>]*)>"#)
        .map_err(|e| invalid(e.to_string()))?;

    let mut paths = Vec::new();
    for caps in element_re.captures_iter(content) {
        let element = &caps[1];
        let attrs = &caps[2];
        let path = match element {
            "path" => match attribute(attrs, "d") {
                Some(d) => parse_path_data(d)?,
                None => continue,
            },
            "line" => {
                let from = Point::new(
                    numeric_attribute(attrs, "x1", element)?,
                    numeric_attribute(attrs, "y1", element)?,
                );
                let to = Point::new(
                    numeric_attribute(attrs, "x2", element)?,
                    numeric_attribute(attrs, "y2", element)?,
                );
                vec![Segment::line(from, to)]
            }
            "polyline" | "polygon" => {
                let points = attribute(attrs, "points")
                    .ok_or_else(|| invalid(format!("<{}> is missing 'points'", element)))?;
                polyline(&parse_point_list(points)?, element == "polygon")
            }
            _ => continue,
        };

        if path.is_empty() {
            continue;
        }
        let path = match &group_transform {
            Some(t) => path.iter().map(|s| s.transformed(t)).collect(),
            None => path,
        };
        paths.push(path);
    }

    if paths.is_empty() {
        return Err(GeometryError::NoDrawablePaths.into());
    }
    Ok(paths)
}

/// Read and parse an SVG file
pub fn load_svg(path: &StdPath) -> Result<Vec<SourcePath>> {
    let content = std::fs::read_to_string(path)?;
    let paths = parse_svg(&content)?;
    tracing::info!("Loaded {} paths from {}", paths.len(), path.display());
    Ok(paths)
}
