//! Serial communication with the arm controller

pub mod serial;
pub mod transport;

use armplot_core::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for opening a serial link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Port name (e.g. "/dev/ttyACM0", "COM3")
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for a single blocking read
    pub read_timeout: Duration,
}

impl ConnectionParams {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout: Duration::from_millis(100),
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(ConnectionError::InvalidParameters {
                reason: "no serial port given".to_string(),
            }
            .into());
        }
        if self.baud_rate == 0 {
            return Err(ConnectionError::InvalidParameters {
                reason: "baud rate must be positive".to_string(),
            }
            .into());
        }
        if self.read_timeout.is_zero() {
            return Err(ConnectionError::InvalidParameters {
                reason: "read timeout must be positive".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
