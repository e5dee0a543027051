//! # armplot Core
//!
//! Core types for armplot: the point/stroke/command data model shared by the
//! geometry pipeline and the serial transport, the point and command file
//! formats, and the unified error taxonomy.

pub mod data;
pub mod error;

pub use data::{
    command::check_well_formed, files, parse_point_line, ArmGeometry, Command, PathPoint, Point,
    Stroke, YAxis, GAP_TOKEN,
};

pub use error::{ConnectionError, Error, FileFormatError, GeometryError, Result, TransportError};
