//! Planning goal specification.

use thiserror::Error;

use crate::core::Pose3D;
use crate::robot::JointConfig;

/// What the planner must reach.
#[derive(Clone, Debug)]
pub enum GoalSpec {
    /// A joint configuration, with a per-joint tolerance.
    Configuration {
        /// Target joint values
        target: JointConfig,
        /// Per-joint acceptance tolerance (radians)
        tolerance: Vec<f64>,
    },
    /// A Cartesian pose of the robot's planning link.
    Pose {
        /// Target pose in the world frame
        pose: Pose3D,
        /// Positional acceptance tolerance (meters)
        xyz_tolerance: f64,
        /// Angular acceptance tolerance (radians)
        rpy_tolerance: f64,
    },
}

impl GoalSpec {
    /// Joint goal with a uniform tolerance on every joint.
    pub fn configuration(target: JointConfig, tolerance: f64) -> Self {
        let n = target.len();
        GoalSpec::Configuration {
            target,
            tolerance: vec![tolerance; n],
        }
    }

    /// Pose goal.
    pub fn pose(pose: Pose3D, xyz_tolerance: f64, rpy_tolerance: f64) -> Self {
        GoalSpec::Pose {
            pose,
            xyz_tolerance,
            rpy_tolerance,
        }
    }
}

/// Error validating a [`GoalSpec`] against the robot model.
#[derive(Debug, Error, PartialEq)]
pub enum GoalError {
    #[error("goal names {got} joints but the robot has {expected}")]
    WrongJointCount { expected: usize, got: usize },
    #[error("goal tolerance must be positive")]
    NonPositiveTolerance,
}

impl GoalSpec {
    /// Validate shape and tolerances for a robot with `num_joints` joints.
    pub fn validate(&self, num_joints: usize) -> Result<(), GoalError> {
        match self {
            GoalSpec::Configuration { target, tolerance } => {
                if target.len() != num_joints || tolerance.len() != num_joints {
                    return Err(GoalError::WrongJointCount {
                        expected: num_joints,
                        got: target.len(),
                    });
                }
                if tolerance.iter().any(|&t| t <= 0.0) {
                    return Err(GoalError::NonPositiveTolerance);
                }
                Ok(())
            }
            GoalSpec::Pose {
                xyz_tolerance,
                rpy_tolerance,
                ..
            } => {
                if *xyz_tolerance <= 0.0 || *rpy_tolerance <= 0.0 {
                    return Err(GoalError::NonPositiveTolerance);
                }
                Ok(())
            }
        }
    }
}
