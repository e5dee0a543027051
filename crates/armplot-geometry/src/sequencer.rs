//! Command sequencing
//!
//! Walks the mapped point stream, turning gaps into alternating pen
//! commands and coordinates into joint-angle moves, then wraps the result in
//! the fixed `START, PEN DOWN … PEN UP, END` frame.

use crate::kinematics::{IkSolution, KinematicsSolver};
use armplot_core::{ArmGeometry, Command, PathPoint, Point};

/// Commands for one drawing plus the targets that had to be skipped
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub commands: Vec<Command>,
    pub dropped: Vec<Point>,
}

impl Sequence {
    /// Number of `Move` commands
    pub fn move_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_move()).count()
    }
}

/// Turns a point stream into a well-formed command stream
#[derive(Debug, Clone, Copy)]
pub struct CommandSequencer {
    solver: KinematicsSolver,
}

impl CommandSequencer {
    pub fn new(arm: ArmGeometry) -> Self {
        Self {
            solver: KinematicsSolver::new(arm),
        }
    }

    pub fn sequence(&self, points: &[PathPoint]) -> Sequence {
        let mut body = Vec::with_capacity(points.len());
        let mut dropped = Vec::new();
        let mut pen_down = true;

        for pp in points {
            match pp {
                PathPoint::Gap => {
                    body.push(if pen_down {
                        Command::PenUp
                    } else {
                        Command::PenDown
                    });
                    pen_down = !pen_down;
                }
                PathPoint::Coord(p) => match self.solver.solve(*p) {
                    IkSolution::Reachable(angles) => body.push(Command::Move {
                        theta1: angles.theta1,
                        theta2: angles.theta2,
                    }),
                    IkSolution::Unreachable { point, reason } => {
                        tracing::warn!("Skipping point {}: {}", point, reason);
                        dropped.push(point);
                    }
                },
            }
        }

        // The closing PEN UP already lifts the pen.
        if body.last() == Some(&Command::PenUp) {
            body.pop();
        }

        let mut commands = Vec::with_capacity(body.len() + 4);
        commands.push(Command::Start);
        commands.push(Command::PenDown);
        commands.extend(body);
        commands.push(Command::PenUp);
        commands.push(Command::End);

        Sequence { commands, dropped }
    }
}
