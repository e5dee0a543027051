//! Error handling for armplot
//!
//! Provides error types for every layer of the pipeline:
//! - Geometry errors (malformed source drawings, invalid parameters)
//! - File format errors (point and command files)
//! - Connection errors (serial link)
//! - Transport errors (controller protocol)
//!
//! All error types use `thiserror` for ergonomic error handling.
//! Unreachable targets are deliberately absent here: the kinematics solver
//! reports them as a result variant and the sequencer skips them.

use std::path::PathBuf;
use thiserror::Error;

/// Geometry error type
///
/// Raised while turning a source drawing into strokes. Fatal for the
/// input file it came from.
#[derive(Error, Debug, Clone)]
pub enum GeometryError {
    /// A segment produced a non-finite sample
    #[error("Malformed segment {segment} in path {path}: {reason}")]
    MalformedSegment {
        /// Index of the source path.
        path: usize,
        /// Index of the segment within its path.
        segment: usize,
        /// What went wrong while evaluating it.
        reason: String,
    },

    /// The vector document could not be parsed
    #[error("Invalid SVG: {reason}")]
    InvalidSvg {
        /// The reason the document was rejected.
        reason: String,
    },

    /// The document parsed but contained nothing to draw
    #[error("No drawable paths found")]
    NoDrawablePaths,

    /// A tuning parameter is outside its valid range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// File format error type
///
/// Represents errors reading point files and command files.
#[derive(Error, Debug, Clone)]
pub enum FileFormatError {
    /// A line matched neither accepted shape
    #[error("Invalid line {line_number} '{content}': {reason}")]
    InvalidLine {
        /// The 1-based line number.
        line_number: usize,
        /// The offending line, trimmed.
        content: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A command file had no actionable lines
    #[error("No commands found in {}", path.display())]
    EmptyCommandSet {
        /// The command file.
        path: PathBuf,
    },
}

/// Connection error type
///
/// Represents errors opening or using the serial link to the controller.
#[derive(Error, Debug, Clone)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port} (check the port name and that the device is plugged in)")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Port is already in use
    #[error("Port already in use: {port} (close any serial monitor or other program using it)")]
    PortInUse {
        /// The name of the port that is in use.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// No data arrived within the allowed time
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Connection lost
    #[error("Connection lost: {reason}")]
    ConnectionLost {
        /// The reason the connection was lost.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },

    /// I/O error on the link
    #[error("I/O error on {port}: {reason}")]
    IoError {
        /// The port the error happened on.
        port: String,
        /// The reason for the I/O error.
        reason: String,
    },
}

/// Transport error type
///
/// Represents protocol-level failures while streaming commands.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The controller reported an error; streaming stopped
    #[error("Controller reported error after {sent} commands: {line}")]
    ControllerError {
        /// The line received from the controller.
        line: String,
        /// How many commands had been sent when it arrived.
        sent: usize,
    },

    /// Buffer settings leave no room for a batch
    #[error("Invalid batch: buffer capacity {capacity}, low-water mark {low_water_mark}")]
    InvalidBatch {
        /// Controller receive buffer capacity.
        capacity: usize,
        /// Low-water mark kept free.
        low_water_mark: usize,
    },

    /// Nothing to stream
    #[error("No commands to send")]
    NothingToSend,
}

/// Main error type for armplot
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// File format error
    #[error(transparent)]
    FileFormat(#[from] FileFormatError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Transport error
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Shorthand for an invalid tuning parameter
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Geometry(GeometryError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Error::Connection(ConnectionError::ConnectionTimeout { .. })
        )
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_))
    }

    /// Check if this is a geometry error
    pub fn is_geometry_error(&self) -> bool {
        matches!(self, Error::Geometry(_))
    }

    /// Check if the controller reported the failure
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Transport(TransportError::ControllerError { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
