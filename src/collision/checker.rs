//! Sphere-vs-distance-field collision checking.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::grid::OccupancyGrid;
use crate::robot::{
    self, interpolate, max_joint_distance, JointLimits, RobotModel,
};

use super::model::{CollisionGroupModel, CollisionModelError};
use super::state::{CollisionSphereState, RobotCollisionState};

/// Outcome of checking a single sphere.
///
/// Out of bounds is reported separately from collision: it means the
/// sphere left the monitored workspace, not that the motion hit an
/// obstacle, and callers may treat the two differently.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SphereCheck {
    /// No obstacle within the effective radius; the measured obstacle
    /// distance is reported for clearance costing.
    Clear {
        /// Distance to the nearest obstacle (meters)
        distance: f64,
    },
    /// An obstacle lies within the effective radius.
    Collision {
        /// Distance to the nearest obstacle (meters)
        distance: f64,
    },
    /// The sphere center is outside the grid.
    OutOfBounds,
}

impl SphereCheck {
    /// Whether the sphere passed the check.
    #[inline]
    pub fn is_clear(&self) -> bool {
        matches!(self, SphereCheck::Clear { .. })
    }
}

/// Outcome of checking a full configuration.
#[derive(Clone, Debug, PartialEq)]
pub enum StateCheck {
    /// Every sphere is clear; `clearance` is the minimum obstacle
    /// distance over all spheres.
    Valid {
        /// Minimum obstacle distance over all spheres (meters)
        clearance: f64,
    },
    /// A sphere collided with an obstacle.
    Collision {
        /// Name of the first colliding sphere
        sphere: String,
        /// Its measured obstacle distance (meters)
        distance: f64,
    },
    /// A sphere left the monitored workspace. Conservatively invalid
    /// for planning.
    OutOfBounds {
        /// Name of the first out-of-bounds sphere
        sphere: String,
    },
}

impl StateCheck {
    /// Whether the configuration passed the check.
    #[inline]
    pub fn is_valid(&self) -> bool {
        matches!(self, StateCheck::Valid { .. })
    }
}

/// Edge validation policy.
///
/// Checking only endpoints is fast but can tunnel through thin
/// obstacles; interpolated checking bounds the largest unchecked joint
/// motion and is the default.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeCheck {
    /// Validate only the two endpoint configurations
    Endpoints,
    /// Validate endpoints plus interpolated waypoints so that no joint
    /// moves more than `max_joint_step` radians between checks
    Interpolate {
        /// Largest per-joint motion between consecutive checks (radians)
        max_joint_step: f64,
    },
}

/// Collision checking settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Safety margin added to every sphere radius (meters)
    #[serde(default = "defaults::padding")]
    pub padding: f64,
    /// Edge validation policy
    #[serde(default = "defaults::edge_check")]
    pub edge_check: EdgeCheck,
}

mod defaults {
    use super::EdgeCheck;

    pub fn padding() -> f64 {
        0.01
    }

    pub fn edge_check() -> EdgeCheck {
        EdgeCheck::Interpolate {
            max_joint_step: 0.05,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            padding: 0.01, // 1cm safety margin
            edge_check: EdgeCheck::Interpolate {
                max_joint_step: 0.05,
            },
        }
    }
}

/// Collision checker for robot configurations against the occupancy grid.
///
/// Owns the lazily-updated [`RobotCollisionState`]; one checker serves
/// one evaluation context at a time.
pub struct CollisionChecker<'a> {
    grid: &'a OccupancyGrid,
    robot: &'a dyn RobotModel,
    state: RobotCollisionState,
    limits: Vec<JointLimits>,
    config: CheckConfig,
}

impl<'a> CollisionChecker<'a> {
    /// Create a checker for a validated collision group.
    pub fn new(
        grid: &'a OccupancyGrid,
        robot: &'a dyn RobotModel,
        group: &CollisionGroupModel,
        config: CheckConfig,
    ) -> Result<Self, CollisionModelError> {
        group.validate(robot)?;
        let limits = (0..robot.num_joints()).map(|i| robot.joint_limits(i)).collect();
        Ok(Self {
            grid,
            robot,
            state: RobotCollisionState::new(group),
            limits,
            config,
        })
    }

    /// The checking settings.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// The grid being checked against.
    pub fn grid(&self) -> &OccupancyGrid {
        self.grid
    }

    /// Joint limits of the planned joints, in configuration order.
    pub fn joint_limits(&self) -> &[JointLimits] {
        &self.limits
    }

    /// Check one sphere of the group at a configuration.
    ///
    /// Sphere centers are refreshed lazily: if `config` matches the last
    /// checked configuration, no kinematics run.
    pub fn check_sphere(&mut self, config: &[f64], index: usize) -> SphereCheck {
        self.state.update(self.robot, config);
        check_sphere_state(self.grid, &self.state.spheres()[index], self.config.padding)
    }

    /// Check every sphere of the group at a configuration.
    ///
    /// Short-circuits on the first violation; otherwise reports the
    /// minimum obstacle distance over all spheres as the clearance.
    pub fn check_state(&mut self, config: &[f64]) -> StateCheck {
        self.state.update(self.robot, config);

        let mut clearance = f64::INFINITY;
        for sphere in self.state.spheres() {
            match check_sphere_state(self.grid, sphere, self.config.padding) {
                SphereCheck::Clear { distance } => clearance = clearance.min(distance),
                SphereCheck::Collision { distance } => {
                    return StateCheck::Collision {
                        sphere: sphere.model.name.clone(),
                        distance,
                    };
                }
                SphereCheck::OutOfBounds => {
                    return StateCheck::OutOfBounds {
                        sphere: sphere.model.name.clone(),
                    };
                }
            }
        }
        StateCheck::Valid { clearance }
    }

    /// Whether a configuration passes the full check.
    pub fn is_state_valid(&mut self, config: &[f64]) -> bool {
        self.check_state(config).is_valid()
    }

    /// Whether the motion between two configurations is valid under the
    /// configured edge policy.
    pub fn is_edge_valid(&mut self, from: &[f64], to: &[f64]) -> bool {
        if !self.is_state_valid(from) || !self.is_state_valid(to) {
            return false;
        }
        match self.config.edge_check {
            EdgeCheck::Endpoints => true,
            EdgeCheck::Interpolate { max_joint_step } => {
                let span = max_joint_distance(&self.limits, from, to);
                let steps = (span / max_joint_step).ceil() as usize;
                for i in 1..steps {
                    let t = i as f64 / steps as f64;
                    let waypoint = interpolate(&self.limits, from, to, t);
                    if !self.is_state_valid(&waypoint) {
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Joint-space displacement between two configurations, summed over
    /// joints. Used by callers attaching costs to motions.
    pub fn motion_length(&self, from: &[f64], to: &[f64]) -> f64 {
        robot::joint_distance(&self.limits, from, to)
    }
}

/// Core sphere-vs-field test.
///
/// The effective radius inflates the sphere by half a cell (the obstacle
/// surface may lie anywhere within its voxel) plus the configured
/// padding; the comparison is inclusive, so an obstacle exactly at the
/// effective radius collides.
fn check_sphere_state(
    grid: &OccupancyGrid,
    sphere: &CollisionSphereState,
    padding: f64,
) -> SphereCheck {
    if sphere.dirty {
        // No kinematics for this sphere: treat as outside the monitored region.
        return SphereCheck::OutOfBounds;
    }

    let coord = grid.world_to_grid(sphere.center);
    let Some(obstacle_distance) = grid.distance(coord) else {
        debug!(
            "[Collision] sphere '{}' at ({:.3}, {:.3}, {:.3}) is out of bounds",
            sphere.model.name, sphere.center.x, sphere.center.y, sphere.center.z
        );
        return SphereCheck::OutOfBounds;
    };

    let effective_radius = sphere.model.radius + 0.5 * grid.resolution() + padding;
    if obstacle_distance <= effective_radius {
        SphereCheck::Collision {
            distance: obstacle_distance,
        }
    } else {
        SphereCheck::Clear {
            distance: obstacle_distance,
        }
    }
}
