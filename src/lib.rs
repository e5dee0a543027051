//! # armplot
//!
//! Draws SVG artwork with a two-link planar arm.
//!
//! ## Architecture
//!
//! armplot is organized as a workspace with multiple crates:
//!
//! 1. **armplot-core** - Points, strokes, commands, file formats, errors
//! 2. **armplot-geometry** - SVG import, stroke extraction, simplification,
//!    workspace mapping, inverse kinematics, command sequencing
//! 3. **armplot-communication** - Serial link and request-driven streaming
//! 4. **armplot-settings** - JSON/TOML configuration
//! 5. **armplot** - `generate`/`send`/`run` orchestration and the CLI

pub mod job;

pub use armplot_communication::{
    list_ports, CancelToken, SerialPortInfo, StreamOutcome, StreamReport,
};
pub use armplot_core::{Command, Error, PathPoint, Point, Result, YAxis};
pub use armplot_geometry::{DrawingPipeline, DrawingStats, PipelineConfig, PipelineOutput};
pub use armplot_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging
///
/// Logs go to stderr. `RUST_LOG` wins when set; otherwise the level is
/// `info`, or `debug` with `verbose`.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
