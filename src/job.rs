//! Run orchestration
//!
//! Ties the pipeline, the command files and the transport together for the
//! three CLI workflows: generate a command file, send one, or do both for
//! every configured input.

use anyhow::{bail, Context};
use armplot_communication::{
    CancelToken, RealSerialPort, SerialLink, SerialTransport, StreamOutcome, StreamReport,
};
use armplot_core::{files, Command, YAxis};
use armplot_geometry::{load_svg, DrawingPipeline, PipelineOutput};
use armplot_settings::Config;
use std::path::{Path, PathBuf};

/// Where one drawing's output went
#[derive(Debug, Clone)]
pub struct GeneratedDrawing {
    pub input: PathBuf,
    pub commands_path: PathBuf,
    pub points_path: Option<PathBuf>,
    pub output: PipelineOutput,
}

/// Output file overrides for [`generate`]
#[derive(Debug, Clone, Default)]
pub struct OutputPaths {
    pub commands: Option<PathBuf>,
    pub points: Option<PathBuf>,
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    Ok(())
}

/// Convert one SVG into a command file (and optionally a point file)
pub fn generate(
    config: &Config,
    input: &Path,
    y_axis: YAxis,
    paths: &OutputPaths,
) -> anyhow::Result<GeneratedDrawing> {
    let pipeline = DrawingPipeline::new(config.pipeline_config()?)?;

    let source = load_svg(input).with_context(|| format!("reading {}", input.display()))?;
    let output = pipeline
        .run(&source, y_axis)
        .with_context(|| format!("processing {}", input.display()))?;

    if !output.dropped.is_empty() {
        tracing::warn!(
            "{}: {} points were out of reach and skipped",
            input.display(),
            output.dropped.len()
        );
    }

    let commands_path = paths
        .commands
        .clone()
        .unwrap_or_else(|| config.commands_path_for(input));
    ensure_parent(&commands_path)?;
    files::write_commands(&commands_path, &output.commands)
        .with_context(|| format!("writing {}", commands_path.display()))?;

    let points_path = paths
        .points
        .clone()
        .or_else(|| config.points_path_for(input));
    if let Some(points_path) = &points_path {
        ensure_parent(points_path)?;
        files::write_points(points_path, &output.points)
            .with_context(|| format!("writing {}", points_path.display()))?;
    }

    tracing::info!(
        "{} -> {} ({} commands)",
        input.display(),
        commands_path.display(),
        output.commands.len()
    );

    Ok(GeneratedDrawing {
        input: input.to_path_buf(),
        commands_path,
        points_path,
        output,
    })
}

/// Stream commands through a link produced by `open`
pub fn stream_with<F>(
    config: &Config,
    commands: &[Command],
    cancel: CancelToken,
    open: F,
) -> anyhow::Result<StreamReport>
where
    F: FnOnce() -> armplot_core::Result<Box<dyn SerialLink>>,
{
    let mut transport = SerialTransport::new(config.transport_config(), cancel)?;
    Ok(transport.stream(commands, open)?)
}

/// Stream commands to the configured serial port
pub fn send(
    config: &Config,
    commands: &[Command],
    port: Option<&str>,
    baud_rate: Option<u32>,
    cancel: CancelToken,
) -> anyhow::Result<StreamReport> {
    let params = config.connection_params(port, baud_rate)?;
    stream_with(config, commands, cancel, || {
        let link: Box<dyn SerialLink> = Box::new(RealSerialPort::open(&params)?);
        Ok(link)
    })
    .with_context(|| format!("sending to {}", params.port))
}

/// Read a command file and stream it
pub fn send_file(
    config: &Config,
    path: &Path,
    port: Option<&str>,
    baud_rate: Option<u32>,
    cancel: CancelToken,
) -> anyhow::Result<StreamReport> {
    let commands =
        files::read_commands(path).with_context(|| format!("reading {}", path.display()))?;
    if let Err(problem) = armplot_core::check_well_formed(&commands) {
        tracing::warn!("{}: {}", path.display(), problem);
    }
    send(config, &commands, port, baud_rate, cancel)
}

/// Outcome of a [`run`] over the configured inputs
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Inputs that were streamed, with their transport reports
    pub sent: Vec<(PathBuf, StreamReport)>,
    /// Inputs that could not be converted, with the reason
    pub skipped: Vec<(PathBuf, String)>,
}

impl RunSummary {
    pub fn is_cancelled(&self) -> bool {
        self.sent
            .last()
            .is_some_and(|(_, report)| report.outcome == StreamOutcome::Cancelled)
    }
}

/// Generate and send every configured input to the configured port
pub fn run(config: &Config, cancel: CancelToken) -> anyhow::Result<RunSummary> {
    let params = config.connection_params(None, None)?;
    run_with(config, cancel, || {
        let link: Box<dyn SerialLink> = Box::new(RealSerialPort::open(&params)?);
        Ok(link)
    })
}

/// Generate and send every configured input, in order
///
/// An input whose SVG cannot be read or converted is logged and skipped;
/// the remaining inputs still run. Connection and controller failures stop
/// the whole run, as does cancellation.
pub fn run_with<F>(
    config: &Config,
    cancel: CancelToken,
    mut open: F,
) -> anyhow::Result<RunSummary>
where
    F: FnMut() -> armplot_core::Result<Box<dyn SerialLink>>,
{
    if config.inputs.is_empty() {
        bail!("no [[inputs]] configured");
    }

    let mut summary = RunSummary::default();
    for input in &config.inputs {
        let drawing = match generate(config, &input.path, input.y_axis, &OutputPaths::default()) {
            Ok(drawing) => drawing,
            Err(e) => {
                tracing::error!("Skipping {}: {:#}", input.path.display(), e);
                summary.skipped.push((input.path.clone(), format!("{:#}", e)));
                continue;
            }
        };

        let report = stream_with(config, &drawing.output.commands, cancel.clone(), &mut open)
            .with_context(|| format!("sending {}", input.path.display()))?;
        summary.sent.push((input.path.clone(), report));

        if summary.is_cancelled() {
            tracing::warn!("Run cancelled during {}", input.path.display());
            break;
        }
    }

    if summary.sent.is_empty() && !summary.skipped.is_empty() {
        bail!(
            "none of the {} configured inputs could be converted",
            summary.skipped.len()
        );
    }
    Ok(summary)
}
