//! armplot Settings Crate
//!
//! Loads, validates and saves the run configuration, and turns it into the
//! parameter structs the pipeline and the transport take.

pub mod config;
pub mod error;

pub use config::{
    ArmSettings, Config, ConnectionSettings, ControllerSettings, ExtractionSettings,
    InputSettings, OutputSettings, WorkspaceSettings,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
