//! Inverse kinematics for a two-link planar arm
//!
//! Converts a pen target into shoulder and elbow angles (degrees). Only the
//! elbow-up branch is produced. Device-specific remapping (servo ranges,
//! mounting offsets) is left to whatever consumes the angles.

use armplot_core::{ArmGeometry, Point};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Targets closer to the base than this fraction of full reach are treated
/// as the base itself
const SINGULARITY_EPSILON: f64 = 1e-12;

/// Shoulder and elbow angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    /// Angle of the first link from the +X axis
    pub theta1: f64,
    /// Elbow angle of the second link relative to the first
    pub theta2: f64,
}

impl JointAngles {
    /// Fixed pose used at the base singularity: shoulder along +X, elbow fully folded
    pub const FOLDED: JointAngles = JointAngles {
        theta1: 0.0,
        theta2: 180.0,
    };
}

/// Why a target cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreachableReason {
    /// Beyond `L1 + L2`
    TooFar,
    /// Inside `|L1 - L2|`
    TooClose,
    /// Coordinate is NaN or infinite
    NonFinite,
}

impl fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFar => write!(f, "too far"),
            Self::TooClose => write!(f, "too close"),
            Self::NonFinite => write!(f, "not a finite coordinate"),
        }
    }
}

/// Outcome of solving for one target
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IkSolution {
    Reachable(JointAngles),
    Unreachable {
        point: Point,
        reason: UnreachableReason,
    },
}

impl IkSolution {
    pub fn angles(&self) -> Option<JointAngles> {
        match self {
            Self::Reachable(a) => Some(*a),
            Self::Unreachable { .. } => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable(_))
    }
}

/// Solve the elbow-up inverse kinematics for `target`
pub fn solve(target: Point, arm: &ArmGeometry) -> IkSolution {
    if !target.is_finite() {
        return IkSolution::Unreachable {
            point: target,
            reason: UnreachableReason::NonFinite,
        };
    }

    let (l1, l2) = (arm.l1, arm.l2);
    let r = target.norm();

    if r > arm.max_reach() {
        return IkSolution::Unreachable {
            point: target,
            reason: UnreachableReason::TooFar,
        };
    }
    if r < arm.min_reach() {
        return IkSolution::Unreachable {
            point: target,
            reason: UnreachableReason::TooClose,
        };
    }
    if r <= SINGULARITY_EPSILON * arm.max_reach() {
        return IkSolution::Reachable(JointAngles::FOLDED);
    }

    let cos_elbow = ((r * r - l1 * l1 - l2 * l2) / (2.0 * l1 * l2)).clamp(-1.0, 1.0);
    let theta2 = cos_elbow.acos();

    let cos_inner = ((l1 * l1 + r * r - l2 * l2) / (2.0 * l1 * r)).clamp(-1.0, 1.0);
    let theta1 = target.y.atan2(target.x) - cos_inner.acos();

    IkSolution::Reachable(JointAngles {
        theta1: theta1.to_degrees(),
        theta2: theta2.to_degrees(),
    })
}

/// Pen position for a pair of joint angles
pub fn forward(angles: JointAngles, arm: &ArmGeometry) -> Point {
    let t1 = angles.theta1.to_radians();
    let t12 = t1 + angles.theta2.to_radians();
    Point::new(
        arm.l1 * t1.cos() + arm.l2 * t12.cos(),
        arm.l1 * t1.sin() + arm.l2 * t12.sin(),
    )
}

/// Solver bound to one arm
#[derive(Debug, Clone, Copy)]
pub struct KinematicsSolver {
    arm: ArmGeometry,
}

impl KinematicsSolver {
    pub fn new(arm: ArmGeometry) -> Self {
        Self { arm }
    }

    pub fn arm(&self) -> &ArmGeometry {
        &self.arm
    }

    pub fn solve(&self, target: Point) -> IkSolution {
        solve(target, &self.arm)
    }

    pub fn forward(&self, angles: JointAngles) -> Point {
        forward(angles, &self.arm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm(l1: f64, l2: f64) -> ArmGeometry {
        ArmGeometry::new(l1, l2).unwrap()
    }

    fn assert_round_trip(target: Point, arm: &ArmGeometry) {
        let angles = solve(target, arm)
            .angles()
            .unwrap_or_else(|| panic!("{target} should be reachable"));
        let back = forward(angles, arm);
        assert!(
            back.distance_to(&target) < 1e-9,
            "{target} -> {angles:?} -> {back}"
        );
    }

    #[test]
    fn test_fully_extended() {
        let a = arm(10.0, 10.0);
        let angles = solve(Point::new(20.0, 0.0), &a).angles().unwrap();
        assert!(angles.theta1.abs() < 1e-9);
        assert!(angles.theta2.abs() < 1e-6);
    }

    #[test]
    fn test_right_angle_elbow() {
        let a = arm(10.0, 10.0);
        let target = Point::new(10.0, 10.0);
        let angles = solve(target, &a).angles().unwrap();
        assert!((angles.theta2 - 90.0).abs() < 1e-9);
        assert!(angles.theta1.abs() < 1e-9);
        assert_round_trip(target, &a);
    }

    #[test]
    fn test_elbow_up_branch() {
        let a = arm(10.0, 10.0);
        let angles = solve(Point::new(0.0, 15.0), &a).angles().unwrap();
        assert!(angles.theta2 > 0.0);
        assert!(angles.theta1 < 90.0);
    }

    #[test]
    fn test_round_trip_various() {
        let a = arm(12.0, 7.0);
        for target in [
            Point::new(10.0, 3.0),
            Point::new(-4.0, 15.0),
            Point::new(0.0, -6.0),
            Point::new(18.9, 0.1),
        ] {
            assert_round_trip(target, &a);
        }
    }

    #[test]
    fn test_too_far() {
        let a = arm(10.0, 10.0);
        let solution = solve(Point::new(20.0, 0.1), &a);
        assert!(matches!(
            solution,
            IkSolution::Unreachable {
                reason: UnreachableReason::TooFar,
                ..
            }
        ));
    }

    #[test]
    fn test_too_close() {
        let a = arm(10.0, 4.0);
        let solution = solve(Point::new(1.0, 1.0), &a);
        assert_eq!(
            solution,
            IkSolution::Unreachable {
                point: Point::new(1.0, 1.0),
                reason: UnreachableReason::TooClose
            }
        );
        assert!(!solve(Point::new(0.0, 0.0), &a).is_reachable());
    }

    #[test]
    fn test_origin_singularity_returns_folded_pose() {
        let a = arm(10.0, 10.0);
        assert_eq!(
            solve(Point::new(0.0, 0.0), &a),
            IkSolution::Reachable(JointAngles::FOLDED)
        );
        let back = forward(JointAngles::FOLDED, &a);
        assert!(back.norm() < 1e-9);
    }

    #[test]
    fn test_boundary_is_reachable() {
        let a = arm(10.0, 4.0);
        assert!(solve(Point::new(6.0, 0.0), &a).is_reachable());
        assert!(solve(Point::new(0.0, 14.0), &a).is_reachable());
    }

    #[test]
    fn test_non_finite_target() {
        let a = arm(10.0, 10.0);
        assert!(matches!(
            solve(Point::new(f64::NAN, 1.0), &a),
            IkSolution::Unreachable {
                reason: UnreachableReason::NonFinite,
                ..
            }
        ));
    }
}
