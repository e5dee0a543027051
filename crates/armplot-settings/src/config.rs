//! Configuration for armplot
//!
//! Everything a run needs comes from here: arm dimensions, pipeline tuning,
//! controller buffer sizes, serial settings, output locations and the list
//! of drawings. Files are JSON or TOML, chosen by extension. Every section
//! may be omitted and falls back to its defaults.
//!
//! ```toml
//! [arm]
//! l1 = 10.0
//! l2 = 10.0
//!
//! [connection]
//! port = "/dev/ttyACM0"
//!
//! [[inputs]]
//! path = "drawings/star.svg"
//! y_axis = "down"
//! ```

use crate::error::{ConfigError, SettingsError, SettingsResult};
use armplot_communication::{ConnectionParams, FlowControl, TransportConfig};
use armplot_core::{ArmGeometry, YAxis};
use armplot_geometry::{mapper::validate_margin, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Link lengths of the arm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmSettings {
    /// Shoulder-to-elbow length
    pub l1: f64,
    /// Elbow-to-pen length
    pub l2: f64,
}

impl Default for ArmSettings {
    fn default() -> Self {
        Self { l1: 10.0, l2: 10.0 }
    }
}

/// Sampling and simplification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// Samples taken from every path segment
    pub samples_per_segment: usize,
    /// Douglas–Peucker tolerance in drawing units
    pub tolerance: f64,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            samples_per_segment: 20,
            tolerance: 0.5,
        }
    }
}

/// Placement inside the arm's reach
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceSettings {
    /// Clearance in arm units
    pub margin: f64,
    /// Convention used when the command line does not name one
    pub y_axis: YAxis,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            margin: 1.0,
            y_axis: YAxis::Down,
        }
    }
}

/// Controller buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerSettings {
    pub buffer_capacity: usize,
    pub low_water_mark: usize,
    pub flow_control: FlowControl,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        let transport = TransportConfig::default();
        Self {
            buffer_capacity: transport.buffer_capacity,
            low_water_mark: transport.low_water_mark,
            flow_control: transport.flow_control,
        }
    }
}

/// Serial link and timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Serial port; required for sending
    pub port: Option<String>,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Wait after opening while the board resets
    pub settle_delay_ms: u64,
    /// Pause after each command
    pub send_delay_ms: u64,
    pub poll_interval_ms: u64,
    /// Quiet period that ends the drain
    pub idle_timeout_ms: u64,
    /// Quiet period that aborts a run in progress
    pub response_timeout_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
            read_timeout_ms: 100,
            settle_delay_ms: 2000,
            send_delay_ms: 20,
            poll_interval_ms: 5,
            idle_timeout_ms: 3000,
            response_timeout_ms: 30_000,
        }
    }
}

/// Where generated files go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub commands_dir: PathBuf,
    /// Mapped point streams are only written when this is set
    pub points_dir: Option<PathBuf>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            commands_dir: PathBuf::from("output"),
            points_dir: None,
        }
    }
}

/// One drawing to process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSettings {
    pub path: PathBuf,
    pub y_axis: YAxis,
}

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub arm: ArmSettings,
    pub extraction: ExtractionSettings,
    pub workspace: WorkspaceSettings,
    pub controller: ControllerSettings,
    pub connection: ConnectionSettings,
    pub output: OutputSettings,
    pub inputs: Vec<InputSettings>,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let arm = self.arm_geometry()?;

        if self.extraction.samples_per_segment == 0 {
            return Err(SettingsError::invalid(
                "extraction.samples_per_segment",
                "must be at least 1",
            ));
        }
        if !self.extraction.tolerance.is_finite() || self.extraction.tolerance < 0.0 {
            return Err(SettingsError::invalid(
                "extraction.tolerance",
                "must be a non-negative number",
            ));
        }
        validate_margin(&arm, self.workspace.margin)
            .map_err(|e| SettingsError::invalid("workspace.margin", e.to_string()))?;

        if self.controller.buffer_capacity == 0 {
            return Err(SettingsError::invalid(
                "controller.buffer_capacity",
                "must be > 0",
            ));
        }
        if self.controller.low_water_mark >= self.controller.buffer_capacity {
            return Err(SettingsError::invalid(
                "controller.low_water_mark",
                format!(
                    "must be below buffer_capacity ({})",
                    self.controller.buffer_capacity
                ),
            ));
        }

        if self.connection.baud_rate == 0 {
            return Err(SettingsError::invalid("connection.baud_rate", "must be > 0"));
        }
        for (key, value) in [
            ("connection.read_timeout_ms", self.connection.read_timeout_ms),
            ("connection.idle_timeout_ms", self.connection.idle_timeout_ms),
            (
                "connection.response_timeout_ms",
                self.connection.response_timeout_ms,
            ),
        ] {
            if value == 0 {
                return Err(SettingsError::invalid(key, "must be > 0"));
            }
        }
        if let Some(port) = &self.connection.port {
            if port.trim().is_empty() {
                return Err(SettingsError::invalid("connection.port", "must not be empty"));
            }
        }

        for (index, input) in self.inputs.iter().enumerate() {
            if input.path.as_os_str().is_empty() {
                return Err(SettingsError::invalid(
                    format!("inputs[{}].path", index),
                    "must not be empty",
                ));
            }
        }

        Ok(())
    }

    pub fn arm_geometry(&self) -> SettingsResult<ArmGeometry> {
        ArmGeometry::new(self.arm.l1, self.arm.l2)
            .map_err(|e| SettingsError::invalid("arm", e.to_string()))
    }

    pub fn pipeline_config(&self) -> SettingsResult<PipelineConfig> {
        Ok(PipelineConfig {
            arm: self.arm_geometry()?,
            samples_per_segment: self.extraction.samples_per_segment,
            tolerance: self.extraction.tolerance,
            margin: self.workspace.margin,
        })
    }

    pub fn transport_config(&self) -> TransportConfig {
        let c = &self.connection;
        TransportConfig {
            buffer_capacity: self.controller.buffer_capacity,
            low_water_mark: self.controller.low_water_mark,
            flow_control: self.controller.flow_control,
            settle_delay: Duration::from_millis(c.settle_delay_ms),
            send_delay: Duration::from_millis(c.send_delay_ms),
            poll_interval: Duration::from_millis(c.poll_interval_ms),
            idle_timeout: Duration::from_millis(c.idle_timeout_ms),
            response_timeout: Duration::from_millis(c.response_timeout_ms),
            ..TransportConfig::default()
        }
    }

    /// Serial parameters, with optional command-line overrides
    pub fn connection_params(
        &self,
        port: Option<&str>,
        baud_rate: Option<u32>,
    ) -> SettingsResult<ConnectionParams> {
        let port = port
            .map(str::to_string)
            .or_else(|| self.connection.port.clone())
            .ok_or_else(|| ConfigError::MissingKey("connection.port".to_string()))?;

        Ok(
            ConnectionParams::new(port, baud_rate.unwrap_or(self.connection.baud_rate))
                .with_read_timeout(Duration::from_millis(self.connection.read_timeout_ms)),
        )
    }

    /// Command file written for an input drawing
    pub fn commands_path_for(&self, input: &Path) -> PathBuf {
        self.output
            .commands_dir
            .join(format!("commands_{}.txt", file_stem(input)))
    }

    /// Point file written for an input drawing, if enabled
    pub fn points_path_for(&self, input: &Path) -> Option<PathBuf> {
        self.output
            .points_dir
            .as_ref()
            .map(|dir| dir.join(format!("points_{}.txt", file_stem(input))))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "drawing".to_string())
}
