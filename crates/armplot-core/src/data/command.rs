//! Arm commands and their line representation
//!
//! The same text is used for command files and on the wire. The tokens match
//! what the arm firmware's line reader accepts: `START`, `END`, `PEN UP`,
//! `PEN DOWN` and `(shoulder, elbow)` angle pairs in degrees.

use super::parse_pair;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const START_TOKEN: &str = "START";
pub const END_TOKEN: &str = "END";
pub const PEN_UP_TOKEN: &str = "PEN UP";
pub const PEN_DOWN_TOKEN: &str = "PEN DOWN";

/// A single instruction for the arm controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Start,
    End,
    PenUp,
    PenDown,
    /// Joint angles in degrees
    Move { theta1: f64, theta2: f64 },
}

impl Command {
    /// Whether this command changes pen state
    pub fn is_pen(&self) -> bool {
        matches!(self, Self::PenUp | Self::PenDown)
    }

    pub fn is_move(&self) -> bool {
        matches!(self, Self::Move { .. })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "{}", START_TOKEN),
            Self::End => write!(f, "{}", END_TOKEN),
            Self::PenUp => write!(f, "{}", PEN_UP_TOKEN),
            Self::PenDown => write!(f, "{}", PEN_DOWN_TOKEN),
            Self::Move { theta1, theta2 } => write!(f, "({:.4}, {:.4})", theta1, theta2),
        }
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            START_TOKEN => Ok(Self::Start),
            END_TOKEN => Ok(Self::End),
            PEN_UP_TOKEN => Ok(Self::PenUp),
            PEN_DOWN_TOKEN => Ok(Self::PenDown),
            _ => {
                let (theta1, theta2) = parse_pair(s)?;
                Ok(Self::Move { theta1, theta2 })
            }
        }
    }
}

/// Check the structural rules every command stream must satisfy
///
/// Returns a description of the first violation found.
pub fn check_well_formed(commands: &[Command]) -> Result<(), String> {
    match commands.first() {
        Some(Command::Start) => {}
        other => return Err(format!("stream must begin with START, found {:?}", other)),
    }
    match commands.last() {
        Some(Command::End) => {}
        other => return Err(format!("stream must end with END, found {:?}", other)),
    }

    let mut last_pen: Option<Command> = None;
    for (index, cmd) in commands.iter().enumerate() {
        if cmd.is_pen() {
            if last_pen == Some(*cmd) {
                return Err(format!("repeated {} at index {}", cmd, index));
            }
            last_pen = Some(*cmd);
        } else if cmd.is_move() {
            last_pen = None;
        }
    }
    Ok(())
}
