//! Point and command file I/O
//!
//! Both formats hold one item per line. Reading is strict: every line must be
//! one of the accepted shapes or the whole file is rejected with the line
//! number. Command files may contain blank lines and `#` comments.

use super::{parse_point_line, Command, PathPoint};
use crate::error::{FileFormatError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Write the merged point stream, one point or `GAP` per line
pub fn write_points(path: &Path, points: &[PathPoint]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for point in points {
        writeln!(writer, "{}", point)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} points to {}", points.len(), path.display());
    Ok(())
}

/// Read a point file written by [`write_points`]
///
/// Blank lines are skipped.
pub fn read_points(path: &Path) -> Result<Vec<PathPoint>> {
    parse_points(File::open(path)?)
}

/// Parse point lines from any reader
pub fn parse_points<R: Read>(reader: R) -> Result<Vec<PathPoint>> {
    let mut points = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        points.push(parse_point_line(index + 1, &line)?);
    }
    Ok(points)
}

/// Write a command file, one command per line
pub fn write_commands(path: &Path, commands: &[Command]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for command in commands {
        writeln!(writer, "{}", command)?;
    }
    writer.flush()?;
    tracing::debug!("Wrote {} commands to {}", commands.len(), path.display());
    Ok(())
}

/// Read a command file
///
/// Fails with `EmptyCommandSet` when nothing actionable remains after
/// dropping blank and comment lines.
pub fn read_commands(path: &Path) -> Result<Vec<Command>> {
    let commands = parse_commands(File::open(path)?)?;
    if commands.is_empty() {
        return Err(FileFormatError::EmptyCommandSet {
            path: path.to_path_buf(),
        }
        .into());
    }
    Ok(commands)
}

/// Parse command lines from any reader
pub fn parse_commands<R: Read>(reader: R) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let command = trimmed
            .parse::<Command>()
            .map_err(|reason| FileFormatError::InvalidLine {
                line_number: index + 1,
                content: trimmed.to_string(),
                reason,
            })?;
        commands.push(command);
    }
    Ok(commands)
}
