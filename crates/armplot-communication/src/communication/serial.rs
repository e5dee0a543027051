//! Serial port communication implementation
//!
//! Provides the blocking link the transport drives:
//! - Port enumeration filtered to likely controller devices
//! - Opening with a bounded read timeout and classified failures
//! - Byte-to-line framing of controller output

use super::ConnectionParams;
use armplot_core::{ConnectionError, Error, Result};
use std::io::{self, Read, Write};

/// Information about an available serial port
#[derive(Debug, Clone)]
pub struct SerialPortInfo {
    /// Port name (e.g., "/dev/ttyUSB0", "COM3")
    pub port_name: String,

    /// Port description (e.g., "USB Serial Port")
    pub description: String,

    /// Manufacturer name if available
    pub manufacturer: Option<String>,

    /// USB vendor ID if applicable
    pub vid: Option<u16>,

    /// USB product ID if applicable
    pub pid: Option<u16>,
}

impl SerialPortInfo {
    pub fn new(port_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            description: description.into(),
            manufacturer: None,
            vid: None,
            pid: None,
        }
    }

    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    pub fn with_usb_ids(mut self, vid: u16, pid: u16) -> Self {
        self.vid = Some(vid);
        self.pid = Some(pid);
        self
    }
}

/// List serial ports that look like a microcontroller board
///
/// - Windows: COM* (e.g., COM1, COM3)
/// - Linux: /dev/ttyUSB*, /dev/ttyACM*
/// - macOS: /dev/cu.usbserial-*, /dev/cu.usbmodem*
pub fn list_ports() -> Result<Vec<SerialPortInfo>> {
    let ports = serialport::available_ports().map_err(|e| {
        tracing::error!("Failed to enumerate serial ports: {}", e);
        Error::other(format!("Failed to enumerate ports: {}", e))
    })?;

    Ok(ports
        .iter()
        .filter(|port| is_controller_port(&port.port_name))
        .map(|port| {
            let info = SerialPortInfo::new(&port.port_name, port_description(port));
            match &port.port_type {
                serialport::SerialPortType::UsbPort(usb) => {
                    let info = info.with_usb_ids(usb.vid, usb.pid);
                    match &usb.manufacturer {
                        Some(mfg) => info.with_manufacturer(mfg),
                        None => info,
                    }
                }
                _ => info,
            }
        })
        .collect())
}

fn is_controller_port(port_name: &str) -> bool {
    if let Some(number) = port_name.strip_prefix("COM") {
        return !number.is_empty() && number.chars().all(|c| c.is_ascii_digit());
    }

    port_name.starts_with("/dev/ttyUSB")
        || port_name.starts_with("/dev/ttyACM")
        || port_name.starts_with("/dev/cu.usbserial-")
        || port_name.starts_with("/dev/cu.usbmodem")
}

fn port_description(port: &serialport::SerialPortInfo) -> String {
    match &port.port_type {
        serialport::SerialPortType::UsbPort(usb) => format!(
            "USB {} {}",
            usb.manufacturer.as_deref().unwrap_or("Device"),
            usb.product.as_deref().unwrap_or("Serial Port")
        ),
        serialport::SerialPortType::BluetoothPort => "Bluetooth Serial".to_string(),
        serialport::SerialPortType::PciPort => "PCI Serial".to_string(),
        _ => "Serial Port".to_string(),
    }
}

/// Map a failed open onto an actionable connection error
pub fn classify_open_error(port: &str, err: &serialport::Error) -> ConnectionError {
    let description = err.description.to_ascii_lowercase();
    let busy = description.contains("busy")
        || description.contains("in use")
        || description.contains("access is denied");

    match err.kind {
        _ if busy => ConnectionError::PortInUse {
            port: port.to_string(),
        },
        serialport::ErrorKind::NoDevice
        | serialport::ErrorKind::Io(io::ErrorKind::NotFound) => ConnectionError::PortNotFound {
            port: port.to_string(),
        },
        serialport::ErrorKind::Io(io::ErrorKind::PermissionDenied) => {
            ConnectionError::FailedToOpen {
                port: port.to_string(),
                reason: format!(
                    "{} (on Linux, add your user to the dialout group)",
                    err.description
                ),
            }
        }
        _ => ConnectionError::FailedToOpen {
            port: port.to_string(),
            reason: err.description.clone(),
        },
    }
}

/// Blocking byte link to the controller
pub trait SerialLink: Send {
    /// Write data to the link
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;

    /// Read available data; may block up to the read timeout
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Bytes waiting to be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;

    fn name(&self) -> String;

    /// Release the link; later calls fail
    fn close(&mut self) -> io::Result<()>;
}

fn closed(name: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, format!("{} is closed", name))
}

/// Serial link backed by the serialport crate
pub struct RealSerialPort {
    name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl RealSerialPort {
    /// Open a serial port with the given parameters
    pub fn open(params: &ConnectionParams) -> Result<Self> {
        params.validate()?;

        match serialport::new(&params.port, params.baud_rate)
            .timeout(params.read_timeout)
            .open()
        {
            Ok(port) => {
                tracing::info!("Opened {} at {} baud", params.port, params.baud_rate);
                Ok(Self {
                    name: params.port.clone(),
                    port: Some(port),
                })
            }
            Err(e) => {
                tracing::warn!("Failed to open serial port {}: {}", params.port, e);
                Err(classify_open_error(&params.port, &e).into())
            }
        }
    }
}

impl SerialLink for RealSerialPort {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.port.as_mut() {
            Some(port) => {
                let n = port.write(data)?;
                port.flush()?;
                Ok(n)
            }
            None => Err(closed(&self.name)),
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.port.as_mut() {
            Some(port) => match port.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
                other => other,
            },
            None => Err(closed(&self.name)),
        }
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        match self.port.as_ref() {
            Some(port) => port
                .bytes_to_read()
                .map(|n| n as usize)
                .map_err(io::Error::from),
            None => Err(closed(&self.name)),
        }
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn close(&mut self) -> io::Result<()> {
        if self.port.take().is_some() {
            tracing::debug!("Closed {}", self.name);
        }
        Ok(())
    }
}

/// Longest line held before it is flushed without a newline
pub const MAX_LINE_LEN: usize = 4096;

/// Splits incoming bytes into lines
///
/// Bytes are held until a `\n` arrives. Lines are decoded lossily and
/// trimmed, so `\r\n` endings and stray invalid UTF-8 never fail a read.
/// A run of [`MAX_LINE_LEN`] bytes without a newline is emitted as a line
/// of its own.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes and return every line they complete
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                lines.push(self.take_line());
            } else {
                self.pending.push(b);
                if self.pending.len() >= MAX_LINE_LEN {
                    tracing::warn!(
                        "Inbound line exceeded {} bytes without a newline",
                        MAX_LINE_LEN
                    );
                    lines.push(self.take_line());
                }
            }
        }
        lines
    }

    fn take_line(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        line
    }

    /// Bytes received since the last newline
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
