//! Configuration-space lattice presented to the search as a graph.
//!
//! Configurations are interned into an arena the first time they are
//! visited and addressed by integer [`StateId`] from then on. Successor
//! edges come from the action set and are validated through the
//! collision checker before the search ever sees them.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::action::ActionSet;
use crate::collision::{CollisionChecker, StateCheck};
use crate::core::math::normalize_angle;
use crate::robot::{
    joint_delta, joint_distance, max_joint_distance, within_limits, JointConfig, JointLimits,
    RobotModel,
};
use crate::search::SearchSpace;

use super::goal::GoalSpec;

/// Integer identifier of an interned configuration.
pub type StateId = usize;

/// Lattice settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatticeConfig {
    /// Joint-space discretization: configurations within one cell map to
    /// the same state (radians)
    #[serde(default = "defaults::discretization")]
    pub discretization: f64,
    /// Fixed-point cost scale: edge costs are joint-space displacement
    /// times this, rounded up
    #[serde(default = "defaults::cost_per_radian")]
    pub cost_per_radian: u64,
}

mod defaults {
    pub fn discretization() -> f64 {
        0.02
    }

    pub fn cost_per_radian() -> u64 {
        1000
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            discretization: 0.02, // matches the short primitive delta
            cost_per_radian: 1000,
        }
    }
}

/// An interned lattice state.
#[derive(Clone, Debug)]
struct LatticeState {
    /// First configuration seen for this cell; the exact values, not the
    /// cell center
    config: JointConfig,
}

/// The search graph over discretized configurations.
///
/// Lives for one planning episode: states are interned on first visit
/// and discarded with the lattice.
pub struct ManipLattice<'a> {
    robot: &'a dyn RobotModel,
    checker: CollisionChecker<'a>,
    actions: &'a dyn ActionSet,
    config: LatticeConfig,
    limits: Vec<JointLimits>,
    states: Vec<LatticeState>,
    ids: HashMap<Vec<i32>, StateId>,
    goal: Option<GoalSpec>,
}

impl<'a> ManipLattice<'a> {
    /// Create an empty lattice.
    pub fn new(
        robot: &'a dyn RobotModel,
        checker: CollisionChecker<'a>,
        actions: &'a dyn ActionSet,
        config: LatticeConfig,
    ) -> Self {
        let limits = (0..robot.num_joints())
            .map(|i| robot.joint_limits(i))
            .collect();
        Self {
            robot,
            checker,
            actions,
            config,
            limits,
            states: Vec::new(),
            ids: HashMap::new(),
            goal: None,
        }
    }

    /// Number of interned states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Set the goal for this episode.
    pub fn set_goal(&mut self, goal: GoalSpec) {
        self.goal = Some(goal);
    }

    /// The current goal.
    pub fn goal(&self) -> Option<&GoalSpec> {
        self.goal.as_ref()
    }

    /// Intern a configuration, returning its state id.
    ///
    /// Deterministic: configurations within the discretization tolerance
    /// map to the same id; the first configuration seen for a cell is
    /// kept as its representative.
    pub fn state_id(&mut self, config: &[f64]) -> StateId {
        let config = self.normalize(config.to_vec());
        let key = self.discretize(&config);
        if let Some(&id) = self.ids.get(&key) {
            return id;
        }
        let id = self.states.len();
        self.states.push(LatticeState { config });
        self.ids.insert(key, id);
        trace!("[Lattice] interned state {} ({} total)", id, self.states.len());
        id
    }

    /// The representative configuration of a state.
    pub fn config_of(&self, id: StateId) -> Option<&[f64]> {
        self.states.get(id).map(|s| s.config.as_slice())
    }

    /// Collision-check a configuration through the lattice's checker.
    pub fn check_config(&mut self, config: &[f64]) -> StateCheck {
        self.checker.check_state(config)
    }

    /// Whether every joint value satisfies the robot's limits.
    pub fn config_within_limits(&self, config: &[f64]) -> bool {
        within_limits(&self.limits, config)
    }

    /// Metric distance to the goal in radians; `None` for pose goals,
    /// where no joint-space estimate exists.
    pub fn goal_distance(&self, config: &[f64]) -> Option<f64> {
        match &self.goal {
            Some(GoalSpec::Configuration { target, .. }) => {
                Some(max_joint_distance(&self.limits, config, target))
            }
            _ => None,
        }
    }

    /// Wrap continuous joints into [-π, π) so state identity ignores
    /// full turns.
    fn normalize(&self, mut config: JointConfig) -> JointConfig {
        for (limits, value) in self.limits.iter().zip(config.iter_mut()) {
            if limits.continuous {
                *value = normalize_angle(*value);
            }
        }
        config
    }

    fn discretize(&self, config: &[f64]) -> Vec<i32> {
        config
            .iter()
            .map(|&v| (v / self.config.discretization).round() as i32)
            .collect()
    }

    fn edge_cost(&self, from: &[f64], to: &[f64]) -> u64 {
        let length = joint_distance(&self.limits, from, to);
        ((length * self.config.cost_per_radian as f64).ceil() as u64).max(1)
    }
}

impl SearchSpace for ManipLattice<'_> {
    fn successors(&mut self, id: StateId) -> Vec<(StateId, u64)> {
        let Some(from) = self.config_of(id).map(|c| c.to_vec()) else {
            return Vec::new();
        };
        let goal_distance = self.goal_distance(&from);
        let candidates = self.actions.actions(&from, goal_distance);

        let mut successors = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let target = self.normalize(candidate);
            if target.len() != from.len() || !within_limits(&self.limits, &target) {
                continue;
            }
            if !self.checker.is_edge_valid(&from, &target) {
                continue;
            }
            let cost = self.edge_cost(&from, &target);
            let succ_id = self.state_id(&target);
            if succ_id == id {
                // Discretization collapsed the motion into the same cell.
                continue;
            }
            successors.push((succ_id, cost));
        }
        trace!(
            "[Lattice] state {} -> {} successors",
            id,
            successors.len()
        );
        successors
    }

    fn heuristic(&self, id: StateId) -> u64 {
        let Some(config) = self.config_of(id) else {
            return 0;
        };
        match &self.goal {
            Some(GoalSpec::Configuration { target, .. }) => {
                let d = max_joint_distance(&self.limits, config, target);
                (d * self.config.cost_per_radian as f64).floor() as u64
            }
            // No admissible joint-space estimate for a pose goal.
            _ => 0,
        }
    }

    fn is_goal(&self, id: StateId) -> bool {
        let Some(config) = self.config_of(id) else {
            return false;
        };
        match &self.goal {
            Some(GoalSpec::Configuration { target, tolerance }) => self
                .limits
                .iter()
                .zip(config.iter().zip(target.iter().zip(tolerance.iter())))
                .all(|(l, (&v, (&t, &tol)))| joint_delta(l, v, t).abs() <= tol),
            Some(GoalSpec::Pose {
                pose,
                xyz_tolerance,
                rpy_tolerance,
            }) => {
                let link = self.robot.planning_link();
                match self.robot.forward_kinematics(config, link) {
                    Some(actual) => {
                        actual.translation_distance(pose) <= *xyz_tolerance
                            && actual.angular_distance(pose) <= *rpy_tolerance
                    }
                    None => {
                        debug!("[Lattice] no kinematics for planning link '{}'", link);
                        false
                    }
                }
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::UniformActionSet;
    use crate::collision::{
        CheckConfig, CollisionGroupModel, CollisionSphereModel, EdgeCheck,
    };
    use crate::core::{Pose3D, WorldPoint};
    use crate::grid::{GridConfig, OccupancyGrid};
    use nalgebra::Vector3;

    /// Two prismatic joints moving a point probe in the XY plane.
    struct PlanarModel {
        names: Vec<String>,
    }

    impl PlanarModel {
        fn new() -> Self {
            Self {
                names: vec!["x".to_string(), "y".to_string()],
            }
        }
    }

    impl RobotModel for PlanarModel {
        fn num_joints(&self) -> usize {
            2
        }

        fn joint_names(&self) -> &[String] {
            &self.names
        }

        fn joint_limits(&self, _index: usize) -> JointLimits {
            JointLimits::bounded(-1.0, 1.0)
        }

        fn forward_kinematics(&self, config: &[f64], link: &str) -> Option<Pose3D> {
            (link == "probe").then(|| Pose3D::from_translation(config[0], config[1], 0.05))
        }

        fn planning_link(&self) -> &str {
            "probe"
        }
    }

    fn empty_grid() -> OccupancyGrid {
        OccupancyGrid::new(GridConfig {
            size_x: 3.0,
            size_y: 3.0,
            size_z: 0.1,
            origin: WorldPoint::new(-1.5, -1.5, 0.0),
            resolution: 0.1,
            max_distance: 0.5,
            frame: "map".to_string(),
        })
        .unwrap()
    }

    fn probe_group() -> CollisionGroupModel {
        CollisionGroupModel::new(
            "probe",
            vec![CollisionSphereModel::new(
                "tip",
                "probe",
                Vector3::zeros(),
                0.02,
            )],
        )
    }

    fn make_lattice<'a>(
        robot: &'a PlanarModel,
        grid: &'a OccupancyGrid,
        actions: &'a UniformActionSet,
    ) -> ManipLattice<'a> {
        let checker = CollisionChecker::new(
            grid,
            robot,
            &probe_group(),
            CheckConfig {
                padding: 0.0,
                edge_check: EdgeCheck::Endpoints,
            },
        )
        .unwrap();
        ManipLattice::new(robot, checker, actions, LatticeConfig::default())
    }

    #[test]
    fn test_state_id_is_injective_on_cells() {
        let robot = PlanarModel::new();
        let grid = empty_grid();
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);

        let a = lattice.state_id(&[0.0, 0.0]);
        let b = lattice.state_id(&[0.005, 0.0]); // same 0.02 cell
        let c = lattice.state_id(&[0.1, 0.0]);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(lattice.config_of(a).unwrap(), &[0.0, 0.0]);
    }

    #[test]
    fn test_successors_deterministic() {
        let robot = PlanarModel::new();
        let grid = empty_grid();
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);
        lattice.set_goal(GoalSpec::configuration(vec![0.5, 0.5], 0.05));

        let id = lattice.state_id(&[0.0, 0.0]);
        let first = lattice.successors(id);
        let second = lattice.successors(id);
        assert_eq!(first, second);
        assert_eq!(first.len(), 4); // ±0.1 per joint, far from goal
    }

    #[test]
    fn test_successors_respect_limits() {
        let robot = PlanarModel::new();
        let grid = empty_grid();
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);

        // At the +x limit, the +0.1 step on joint 0 must be dropped.
        let id = lattice.state_id(&[1.0, 0.0]);
        let succs = lattice.successors(id);
        assert_eq!(succs.len(), 3);
    }

    #[test]
    fn test_successors_blocked_by_obstacle() {
        let robot = PlanarModel::new();
        let mut grid = empty_grid();
        // Wall just +x of the start cell.
        grid.add_box(WorldPoint::new(0.15, 0.0, 0.05), (0.1, 3.0, 0.1));
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);

        let id = lattice.state_id(&[0.0, 0.0]);
        let succs = lattice.successors(id);
        // +x successor lands next to the wall and is rejected.
        assert!(succs.len() < 4);
    }

    #[test]
    fn test_heuristic_admissible_and_zero_at_goal() {
        let robot = PlanarModel::new();
        let grid = empty_grid();
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);
        lattice.set_goal(GoalSpec::configuration(vec![0.4, 0.0], 0.05));

        let start = lattice.state_id(&[0.0, 0.0]);
        let goal = lattice.state_id(&[0.4, 0.0]);
        assert_eq!(lattice.heuristic(goal), 0);
        // True cost along ±0.1 steps is 4 * 100; heuristic must not exceed it.
        assert!(lattice.heuristic(start) <= 400);
        assert!(lattice.is_goal(goal));
        assert!(!lattice.is_goal(start));
    }

    #[test]
    fn test_pose_goal() {
        let robot = PlanarModel::new();
        let grid = empty_grid();
        let actions = UniformActionSet::with_defaults(2);
        let mut lattice = make_lattice(&robot, &grid, &actions);
        lattice.set_goal(GoalSpec::pose(
            Pose3D::from_translation(0.3, 0.2, 0.05),
            0.02,
            std::f64::consts::PI,
        ));

        let on_goal = lattice.state_id(&[0.3, 0.2]);
        let off_goal = lattice.state_id(&[0.0, 0.0]);
        assert!(lattice.is_goal(on_goal));
        assert!(!lattice.is_goal(off_goal));
        assert_eq!(lattice.heuristic(off_goal), 0);
    }
}
