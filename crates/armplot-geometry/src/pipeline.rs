//! Drawing pipeline
//!
//! Runs a drawing through every stage in order: extraction, simplification,
//! workspace mapping and command sequencing.

use crate::extractor::extract_strokes;
use crate::mapper::{validate_margin, WorkspaceMapper};
use crate::segment::SourcePath;
use crate::sequencer::CommandSequencer;
use crate::simplifier::simplify_stroke;
use crate::svg_import::parse_svg;
use armplot_core::{ArmGeometry, Command, Error, PathPoint, Point, Result, YAxis};
use serde::{Deserialize, Serialize};

/// Parameters shared by every drawing in a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub arm: ArmGeometry,
    /// Samples taken from each source segment
    pub samples_per_segment: usize,
    /// Simplification tolerance in drawing units
    pub tolerance: f64,
    /// Clearance from the workspace edges, in arm units
    pub margin: f64,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_segment == 0 {
            return Err(Error::invalid_parameter(
                "samples_per_segment",
                "must be at least 1",
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::invalid_parameter(
                "tolerance",
                format!("must be a non-negative number, got {}", self.tolerance),
            ));
        }
        validate_margin(&self.arm, self.margin)
    }
}

/// Counts collected while running one drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingStats {
    pub strokes: usize,
    /// Sampled points before simplification
    pub raw_points: usize,
    /// Points left after simplification
    pub nodes: usize,
    /// Targets skipped as unreachable
    pub dropped: usize,
}

/// Everything produced for one drawing
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    /// Mapped point stream, gaps included
    pub points: Vec<PathPoint>,
    pub commands: Vec<Command>,
    pub dropped: Vec<Point>,
    pub stats: DrawingStats,
}

pub struct DrawingPipeline {
    config: PipelineConfig,
    mapper: WorkspaceMapper,
    sequencer: CommandSequencer,
}

impl DrawingPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            mapper: WorkspaceMapper::new(config.arm, config.margin)?,
            sequencer: CommandSequencer::new(config.arm),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, paths: &[SourcePath], y_axis: YAxis) -> Result<PipelineOutput> {
        let strokes = extract_strokes(paths, self.config.samples_per_segment)?;
        let raw_points = strokes.iter().map(|s| s.len()).sum();

        let simplified: Vec<_> = strokes
            .iter()
            .map(|s| simplify_stroke(s, self.config.tolerance))
            .collect();
        let nodes = simplified.iter().map(|s| s.len()).sum();

        let points = self.mapper.map(&simplified, y_axis)?;
        let sequence = self.sequencer.sequence(&points);

        let stats = DrawingStats {
            strokes: strokes.len(),
            raw_points,
            nodes,
            dropped: sequence.dropped.len(),
        };

        tracing::info!(
            "Drawing: {} strokes, {} sampled points, {} nodes, {} commands, {} dropped",
            stats.strokes,
            stats.raw_points,
            stats.nodes,
            sequence.commands.len(),
            stats.dropped
        );

        Ok(PipelineOutput {
            points,
            commands: sequence.commands,
            dropped: sequence.dropped,
            stats,
        })
    }

    /// Parse SVG text and run it
    pub fn run_svg(&self, svg: &str, y_axis: YAxis) -> Result<PipelineOutput> {
        let paths = parse_svg(svg)?;
        self.run(&paths, y_axis)
    }
}
