//! Planning interface.
//!
//! Validates a motion-plan request, builds the per-episode lattice,
//! drives the anytime search, and converts the state path into a joint
//! trajectory with keyed statistics.

use std::collections::BTreeMap;
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

use crate::action::ActionSet;
use crate::collision::{CollisionChecker, CollisionGroupModel, CollisionModelError, StateCheck};
use crate::config::PlanningConfig;
use crate::grid::OccupancyGrid;
use crate::lattice::{GoalSpec, ManipLattice};
use crate::postprocess::shortcut_path;
use crate::robot::{JointConfig, RobotModel};
use crate::search::{AraStar, SearchFailure};

/// A motion-plan request.
#[derive(Clone, Debug)]
pub struct PlanRequest {
    /// Start configuration, one value per robot joint
    pub start: JointConfig,
    /// Goal to reach
    pub goal: GoalSpec,
    /// Planning time budget
    pub allowed_time: Duration,
    /// Override of the configured initial heuristic inflation
    pub epsilon_start: Option<f64>,
    /// Override of the configured inflation decrease between tiers
    pub epsilon_decrease: Option<f64>,
}

impl PlanRequest {
    /// Request with the configured epsilon schedule.
    pub fn new(start: JointConfig, goal: GoalSpec, allowed_time: Duration) -> Self {
        Self {
            start,
            goal,
            allowed_time,
            epsilon_start: None,
            epsilon_decrease: None,
        }
    }
}

/// A planned joint trajectory.
#[derive(Clone, Debug)]
pub struct JointTrajectory {
    /// Joint names, in the order configuration values are given
    pub joint_names: Vec<String>,
    /// Waypoint configurations from start to goal
    pub points: Vec<JointConfig>,
}

/// Statistics of a successful planning call.
#[derive(Clone, Debug)]
pub struct PlanStats {
    /// Heuristic inflation of the first search tier
    pub initial_epsilon: f64,
    /// Inflation bound of the returned solution
    pub final_epsilon: f64,
    /// Expansions spent on the first solution
    pub initial_expansions: usize,
    /// Time spent up to the first solution
    pub initial_time: Duration,
    /// Total expansions over the whole episode
    pub total_expansions: usize,
    /// Total planning time
    pub total_time: Duration,
    /// Solution cost in lattice cost units
    pub solution_cost: u64,
    /// States interned during the episode
    pub num_states: usize,
}

impl PlanStats {
    /// Keyed view of the statistics, all values as f64.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("initial epsilon".to_string(), self.initial_epsilon);
        map.insert("solution epsilon".to_string(), self.final_epsilon);
        map.insert(
            "initial solution expansions".to_string(),
            self.initial_expansions as f64,
        );
        map.insert(
            "initial solution planning time".to_string(),
            self.initial_time.as_secs_f64(),
        );
        map.insert("expansions".to_string(), self.total_expansions as f64);
        map.insert("planning time".to_string(), self.total_time.as_secs_f64());
        map.insert("solution cost".to_string(), self.solution_cost as f64);
        map.insert("states".to_string(), self.num_states as f64);
        map
    }
}

/// A successful planning result.
#[derive(Clone, Debug)]
pub struct PlanResult {
    /// The planned trajectory
    pub trajectory: JointTrajectory,
    /// Episode statistics
    pub stats: PlanStats,
}

/// Why a planning call failed.
#[derive(Debug, Error)]
pub enum PlanningError {
    /// The request is malformed and was rejected before any search.
    #[error("request cannot be serviced: {0}")]
    InvalidRequest(String),
    /// The start configuration fails limits or collision checking.
    #[error("invalid start: {0}")]
    InvalidStart(String),
    /// The goal fails limits or collision checking.
    #[error("invalid goal: {0}")]
    InvalidGoal(String),
    /// The search space was exhausted without reaching the goal.
    #[error("no path found after {expansions} expansions")]
    NoPathFound {
        /// Expansions performed before exhaustion
        expansions: usize,
    },
    /// The time budget ran out before any solution was found.
    #[error("time budget exhausted after {expansions} expansions")]
    TimedOut {
        /// Expansions performed before the deadline
        expansions: usize,
    },
    /// The collision model does not match the robot model.
    #[error(transparent)]
    CollisionModel(#[from] CollisionModelError),
}

/// Crate-level planning result alias.
pub type Result<T> = std::result::Result<T, PlanningError>;

/// The planning entry point.
///
/// Holds the collaborators a planning episode needs; each [`plan`] call
/// builds a fresh lattice, so states are not reused across calls.
///
/// [`plan`]: PlannerInterface::plan
pub struct PlannerInterface<'a> {
    robot: &'a dyn RobotModel,
    grid: &'a OccupancyGrid,
    actions: &'a dyn ActionSet,
    group: CollisionGroupModel,
    config: PlanningConfig,
}

impl<'a> PlannerInterface<'a> {
    /// Create a planner over the given collaborators.
    pub fn new(
        robot: &'a dyn RobotModel,
        grid: &'a OccupancyGrid,
        actions: &'a dyn ActionSet,
        group: CollisionGroupModel,
        config: PlanningConfig,
    ) -> Self {
        Self {
            robot,
            grid,
            actions,
            group,
            config,
        }
    }

    /// Check that a request is serviceable before committing to a search.
    pub fn can_service(&self, request: &PlanRequest) -> Result<()> {
        let num_joints = self.robot.num_joints();
        if request.start.len() != num_joints {
            return Err(PlanningError::InvalidRequest(format!(
                "start has {} joints, robot has {}",
                request.start.len(),
                num_joints
            )));
        }
        request
            .goal
            .validate(num_joints)
            .map_err(|e| PlanningError::InvalidRequest(e.to_string()))?;
        if request.allowed_time.is_zero() {
            return Err(PlanningError::InvalidRequest(
                "allowed time is zero".to_string(),
            ));
        }
        if let Some(epsilon) = request.epsilon_start {
            if epsilon < 1.0 {
                return Err(PlanningError::InvalidRequest(format!(
                    "epsilon must be >= 1, got {epsilon}"
                )));
            }
        }
        Ok(())
    }

    /// Plan a trajectory for the request.
    pub fn plan(&self, request: &PlanRequest) -> Result<PlanResult> {
        self.can_service(request)?;

        let checker =
            CollisionChecker::new(self.grid, self.robot, &self.group, self.config.check)?;
        let mut lattice =
            ManipLattice::new(self.robot, checker, self.actions, self.config.lattice);

        // Start and goal are vetted before a single expansion happens.
        if !lattice.config_within_limits(&request.start) {
            return Err(PlanningError::InvalidStart(
                "start violates joint limits".to_string(),
            ));
        }
        describe_check(lattice.check_config(&request.start)).map_err(PlanningError::InvalidStart)?;

        if let GoalSpec::Configuration { target, .. } = &request.goal {
            if !lattice.config_within_limits(target) {
                return Err(PlanningError::InvalidGoal(
                    "goal violates joint limits".to_string(),
                ));
            }
            describe_check(lattice.check_config(target)).map_err(PlanningError::InvalidGoal)?;
        }

        lattice.set_goal(request.goal.clone());
        let start_id = lattice.state_id(&request.start);

        let mut search_config = self.config.search;
        if let Some(epsilon) = request.epsilon_start {
            search_config.epsilon_start = epsilon;
        }
        if let Some(decrease) = request.epsilon_decrease {
            search_config.epsilon_decrease = decrease;
        }

        debug!(
            "[Planner] searching from state {} with epsilon {:.2}, budget {:?}",
            start_id, search_config.epsilon_start, request.allowed_time
        );
        let mut search = AraStar::new(start_id, search_config);
        let found = search
            .run(&mut lattice, request.allowed_time)
            .map_err(|failure| match failure {
                SearchFailure::Exhausted { expansions } => {
                    PlanningError::NoPathFound { expansions }
                }
                SearchFailure::TimedOut { expansions } => PlanningError::TimedOut { expansions },
            })?;

        let mut points = Vec::with_capacity(found.path.len());
        for &id in &found.path {
            match lattice.config_of(id) {
                Some(config) => points.push(config.to_vec()),
                None => {
                    return Err(PlanningError::NoPathFound {
                        expansions: found.stats.total_expansions,
                    })
                }
            }
        }

        if self.config.shortcut.enabled {
            let mut post_checker =
                CollisionChecker::new(self.grid, self.robot, &self.group, self.config.check)?;
            points = shortcut_path(&mut post_checker, &points, &self.config.shortcut);
        }

        let stats = PlanStats {
            initial_epsilon: found.stats.initial_epsilon,
            final_epsilon: found.stats.final_epsilon,
            initial_expansions: found.stats.initial_expansions,
            initial_time: found.stats.initial_time,
            total_expansions: found.stats.total_expansions,
            total_time: found.stats.total_time,
            solution_cost: found.cost,
            num_states: lattice.num_states(),
        };
        info!(
            "[Planner] solution: {} waypoints, cost {}, epsilon {:.2}, {} expansions in {:?}",
            points.len(),
            stats.solution_cost,
            stats.final_epsilon,
            stats.total_expansions,
            stats.total_time
        );

        Ok(PlanResult {
            trajectory: JointTrajectory {
                joint_names: self.robot.joint_names().to_vec(),
                points,
            },
            stats,
        })
    }
}

/// Turn a failed state check into a human-readable reason.
fn describe_check(check: StateCheck) -> std::result::Result<(), String> {
    match check {
        StateCheck::Valid { .. } => Ok(()),
        StateCheck::Collision { sphere, distance } => Err(format!(
            "sphere '{sphere}' in collision ({distance:.3}m from obstacle)"
        )),
        StateCheck::OutOfBounds { sphere } => {
            Err(format!("sphere '{sphere}' outside the monitored workspace"))
        }
    }
}
