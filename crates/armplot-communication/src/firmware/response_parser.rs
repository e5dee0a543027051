//! Controller response parser
//!
//! Classifies lines received from the arm controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token the controller sends when it can take another batch
pub const REQUEST_TOKEN: &str = "REQUEST";

/// Acknowledgment flavours accepted in line-ack mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AckKind {
    Ok,
    Done,
    Next,
}

/// One line from the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControllerResponse {
    /// Buffer has room for another batch
    Request,
    /// Previous command accepted
    Ack(AckKind),
    /// Any line mentioning an error; always fatal
    Error(String),
    /// Startup banner, debug output and other chatter
    Message(String),
}

impl fmt::Display for ControllerResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => write!(f, "{}", REQUEST_TOKEN),
            Self::Ack(AckKind::Ok) => write!(f, "OK"),
            Self::Ack(AckKind::Done) => write!(f, "DONE"),
            Self::Ack(AckKind::Next) => write!(f, "NEXT"),
            Self::Error(line) => write!(f, "error:{}", line),
            Self::Message(line) => write!(f, "message:{}", line),
        }
    }
}

impl ControllerResponse {
    /// Parse a controller line
    ///
    /// Returns `None` for blank lines. A line containing `error` in any case
    /// wins over everything else, then `REQUEST`, then the exact
    /// acknowledgment words.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();

        if line.is_empty() {
            return None;
        }

        if line.to_ascii_lowercase().contains("error") {
            return Some(Self::Error(line.to_string()));
        }

        if line.contains(REQUEST_TOKEN) {
            return Some(Self::Request);
        }

        let ack = match line.to_ascii_uppercase().as_str() {
            "OK" => Some(AckKind::Ok),
            "DONE" => Some(AckKind::Done),
            "NEXT" => Some(AckKind::Next),
            _ => None,
        };

        Some(match ack {
            Some(kind) => Self::Ack(kind),
            None => Self::Message(line.to_string()),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_ignored() {
        assert_eq!(ControllerResponse::parse(""), None);
        assert_eq!(ControllerResponse::parse("  \r"), None);
    }

    #[test]
    fn test_request_inside_other_text() {
        assert_eq!(
            ControllerResponse::parse("buf=3 REQUEST"),
            Some(ControllerResponse::Request)
        );
    }

    #[test]
    fn test_error_any_case() {
        for line in ["ERROR: out of range", "servo error", "Error REQUEST"] {
            let parsed = ControllerResponse::parse(line).unwrap();
            assert!(parsed.is_error(), "{line}");
        }
    }

    #[test]
    fn test_acks() {
        assert_eq!(
            ControllerResponse::parse("ok"),
            Some(ControllerResponse::Ack(AckKind::Ok))
        );
        assert_eq!(
            ControllerResponse::parse("DONE\r"),
            Some(ControllerResponse::Ack(AckKind::Done))
        );
        assert_eq!(
            ControllerResponse::parse("Next"),
            Some(ControllerResponse::Ack(AckKind::Next))
        );
    }

    #[test]
    fn test_banner_is_message() {
        assert_eq!(
            ControllerResponse::parse("Ready for commands..."),
            Some(ControllerResponse::Message("Ready for commands...".to_string()))
        );
    }
}
