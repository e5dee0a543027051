//! # armplot Geometry
//!
//! Turns vector artwork into joint-angle commands for a two-link arm.
//!
//! ## Stages
//!
//! - **SVG import**: path data and basic shapes into source segments
//! - **Extractor**: sampled strokes, split where a path jumps
//! - **Simplifier**: Douglas–Peucker reduction per stroke
//! - **Mapper**: uniform fit into the arm's reach plus pen-travel gaps
//! - **Kinematics**: elbow-up inverse kinematics
//! - **Sequencer**: framed `START … END` command stream
//!
//! [`DrawingPipeline`] runs all of them in order.

pub mod extractor;
pub mod kinematics;
pub mod mapper;
pub mod pipeline;
pub mod segment;
pub mod sequencer;
pub mod simplifier;
pub mod svg_import;

// Re-export commonly used items
pub use extractor::extract_strokes;
pub use kinematics::{IkSolution, JointAngles, KinematicsSolver, UnreachableReason};
pub use mapper::{bracket_transitions, fit_to_workspace, join_strokes, Bounds, WorkspaceMapper};
pub use pipeline::{DrawingPipeline, DrawingStats, PipelineConfig, PipelineOutput};
pub use segment::{Segment, SourcePath};
pub use sequencer::{CommandSequencer, Sequence};
pub use simplifier::{simplify, simplify_stroke};
pub use svg_import::{load_svg, parse_svg};
