//! # armplot Communication
//!
//! Serial link to the arm controller and the request-driven streaming
//! protocol that feeds it commands without overflowing its buffer.

pub mod communication;
pub mod firmware;

pub use communication::{
    serial::{list_ports, LineBuffer, RealSerialPort, SerialLink, SerialPortInfo},
    transport::{
        CancelToken, FlowControl, SerialTransport, StreamOutcome, StreamReport, TransportConfig,
        TransportState,
    },
    ConnectionParams,
};

pub use firmware::response_parser::{AckKind, ControllerResponse};
