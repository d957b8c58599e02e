//! End-to-end planning tests.
//!
//! Drives the full stack (occupancy grid, sphere collision model,
//! lattice, anytime search, interface) with two small robot models:
//! a 2-link planar revolute arm and an XY gantry probe.

use std::time::Duration;

use approx::assert_relative_eq;
use nalgebra::Vector3;

use bhuja_plan::core::{Pose3D, WorldPoint};
use bhuja_plan::grid::{GridConfig, OccupancyGrid};
use bhuja_plan::robot::{JointLimits, RobotModel};
use bhuja_plan::{
    CollisionChecker, CollisionGroupModel, CollisionSphereModel, GoalSpec, PlanRequest,
    PlannerInterface, PlanningConfig, PlanningError, UniformActionSet,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Two-revolute-joint planar arm in the XY plane.
struct PlanarArm {
    names: Vec<String>,
    l1: f64,
    l2: f64,
}

impl PlanarArm {
    fn new() -> Self {
        Self {
            names: vec!["shoulder".to_string(), "elbow".to_string()],
            l1: 0.4,
            l2: 0.4,
        }
    }
}

impl RobotModel for PlanarArm {
    fn num_joints(&self) -> usize {
        2
    }

    fn joint_names(&self) -> &[String] {
        &self.names
    }

    fn joint_limits(&self, _index: usize) -> JointLimits {
        JointLimits::bounded(-std::f64::consts::PI, std::f64::consts::PI)
    }

    fn forward_kinematics(&self, config: &[f64], link: &str) -> Option<Pose3D> {
        let t1 = config[0];
        let t12 = config[0] + config[1];
        match link {
            "link1" => Some(Pose3D::from_euler(Vector3::zeros(), 0.0, 0.0, t1)),
            "link2" => {
                let elbow = Vector3::new(self.l1 * t1.cos(), self.l1 * t1.sin(), 0.0);
                Some(Pose3D::from_euler(elbow, 0.0, 0.0, t12))
            }
            "tip" => {
                let tip = Vector3::new(
                    self.l1 * t1.cos() + self.l2 * t12.cos(),
                    self.l1 * t1.sin() + self.l2 * t12.sin(),
                    0.0,
                );
                Some(Pose3D::from_euler(tip, 0.0, 0.0, t12))
            }
            _ => None,
        }
    }

    fn planning_link(&self) -> &str {
        "tip"
    }
}

/// Sphere chain covering both arm links.
fn arm_spheres() -> CollisionGroupModel {
    let mut spheres = Vec::new();
    for (i, offset) in [0.1, 0.2, 0.3, 0.4].iter().enumerate() {
        spheres.push(CollisionSphereModel::new(
            format!("l1_{i}"),
            "link1",
            Vector3::new(*offset, 0.0, 0.05),
            0.05,
        ));
    }
    for (i, offset) in [0.1, 0.2, 0.3, 0.4].iter().enumerate() {
        spheres.push(CollisionSphereModel::new(
            format!("l2_{i}"),
            "link2",
            Vector3::new(*offset, 0.0, 0.05),
            0.05,
        ));
    }
    CollisionGroupModel::new("arm", spheres)
}

fn arm_grid() -> OccupancyGrid {
    OccupancyGrid::new(GridConfig {
        size_x: 2.0,
        size_y: 2.0,
        size_z: 0.1,
        origin: WorldPoint::new(-1.0, -1.0, 0.0),
        resolution: 0.05,
        max_distance: 0.3,
        frame: "map".to_string(),
    })
    .unwrap()
}

fn arm_config() -> PlanningConfig {
    PlanningConfig::default()
}

/// XY gantry moving a point probe; joints are the probe coordinates.
struct Gantry {
    names: Vec<String>,
}

impl Gantry {
    fn new() -> Self {
        Self {
            names: vec!["x".to_string(), "y".to_string()],
        }
    }
}

impl RobotModel for Gantry {
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
        (link == "probe").then(|| Pose3D::from_translation(config[0], config[1], 0.0))
    }

    fn planning_link(&self) -> &str {
        "probe"
    }
}

fn gantry_spheres() -> CollisionGroupModel {
    CollisionGroupModel::new(
        "probe",
        vec![CollisionSphereModel::new(
            "tip",
            "probe",
            Vector3::new(0.0, 0.0, 0.05),
            0.02,
        )],
    )
}

fn gantry_grid() -> OccupancyGrid {
    OccupancyGrid::new(GridConfig {
        size_x: 3.0,
        size_y: 3.0,
        size_z: 0.1,
        origin: WorldPoint::new(-1.5, -1.5, 0.0),
        resolution: 0.05,
        max_distance: 0.3,
        frame: "map".to_string(),
    })
    .unwrap()
}

fn budget() -> Duration {
    Duration::from_secs(20)
}

// ============================================================================
// Arm scenarios
// ============================================================================

#[test]
fn plans_straight_line_in_free_space() {
    let robot = PlanarArm::new();
    let grid = arm_grid();
    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.4, -0.2], 0.05),
        budget(),
    );
    let result = planner.plan(&request).unwrap();

    let points = &result.trajectory.points;
    assert!(points.len() >= 2);
    assert_eq!(points[0], vec![0.0, 0.0]);
    let last = points.last().unwrap();
    assert!((last[0] - 0.4).abs() <= 0.05);
    assert!((last[1] + 0.2).abs() <= 0.05);
    assert!(result.stats.total_expansions > 0);
    assert!(result.stats.solution_cost > 0);
    assert_eq!(result.trajectory.joint_names, vec!["shoulder", "elbow"]);
}

#[test]
fn plans_around_obstacle_with_valid_edges() {
    let robot = PlanarArm::new();
    let mut grid = arm_grid();
    // Block the straight-arm sweep at 45 degrees, outside the elbow circle.
    grid.add_box(WorldPoint::new(0.424, 0.424, 0.05), (0.1, 0.1, 0.1));

    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner =
        PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config.clone());

    let goal = GoalSpec::configuration(vec![std::f64::consts::FRAC_PI_2, 0.0], 0.05);
    let request = PlanRequest::new(vec![0.0, 0.0], goal, budget());
    let result = planner.plan(&request).unwrap();

    // Every motion in the returned trajectory must be collision-valid.
    let mut checker =
        CollisionChecker::new(&grid, &robot, &arm_spheres(), config.check).unwrap();
    for segment in result.trajectory.points.windows(2) {
        assert!(checker.is_edge_valid(&segment[0], &segment[1]));
    }

    // The straight sweep is blocked, so some waypoint bends the elbow.
    let bends = result
        .trajectory
        .points
        .iter()
        .any(|p| p[1].abs() > 0.05);
    assert!(bends);
}

#[test]
fn anytime_stats_are_consistent() {
    let robot = PlanarArm::new();
    let grid = arm_grid();
    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.5, 0.3], 0.05),
        budget(),
    );
    let result = planner.plan(&request).unwrap();

    assert_relative_eq!(result.stats.initial_epsilon, 3.0);
    assert!(result.stats.final_epsilon <= result.stats.initial_epsilon);
    assert!(result.stats.final_epsilon >= 1.0);
    assert!(result.stats.initial_expansions <= result.stats.total_expansions);

    let map = result.stats.to_map();
    assert!(map.contains_key("initial epsilon"));
    assert!(map.contains_key("solution epsilon"));
    assert!(map.contains_key("expansions"));
    assert!(map.contains_key("solution cost"));
}

#[test]
fn plans_to_cartesian_pose_goal() {
    let robot = PlanarArm::new();
    let grid = arm_grid();
    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    // Pose reachable at configuration (0.4, 0.2).
    let target = robot.forward_kinematics(&[0.4, 0.2], "tip").unwrap();
    let goal = GoalSpec::pose(target, 0.05, std::f64::consts::PI);
    let request = PlanRequest::new(vec![0.0, 0.0], goal, budget());
    let result = planner.plan(&request).unwrap();

    let last = result.trajectory.points.last().unwrap();
    let reached = robot.forward_kinematics(last, "tip").unwrap();
    assert!(reached.translation_distance(&target) <= 0.05);
}

// ============================================================================
// Failure taxonomy
// ============================================================================

#[test]
fn rejects_malformed_request_before_search() {
    let robot = PlanarArm::new();
    let grid = arm_grid();
    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    // Wrong joint count.
    let request = PlanRequest::new(
        vec![0.0],
        GoalSpec::configuration(vec![0.1, 0.1], 0.05),
        budget(),
    );
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::InvalidRequest(_))
    ));

    // Epsilon below 1.
    let mut request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.1, 0.1], 0.05),
        budget(),
    );
    request.epsilon_start = Some(0.5);
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::InvalidRequest(_))
    ));
}

#[test]
fn start_in_collision_fails_immediately() {
    let robot = PlanarArm::new();
    let mut grid = arm_grid();
    // Obstacle right on the outstretched arm.
    grid.add_sphere(WorldPoint::new(0.4, 0.0, 0.05), 0.05);

    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![1.0, 0.0], 0.05),
        budget(),
    );
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::InvalidStart(_))
    ));
}

#[test]
fn goal_in_collision_is_distinguished_from_no_path() {
    let robot = PlanarArm::new();
    let mut grid = arm_grid();
    // Obstacle on the goal configuration's arm position (along +y).
    grid.add_sphere(WorldPoint::new(0.0, 0.4, 0.05), 0.05);

    let config = arm_config();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, arm_spheres(), config);

    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![std::f64::consts::FRAC_PI_2, 0.0], 0.05),
        budget(),
    );
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::InvalidGoal(_))
    ));
}

#[test]
fn enclosed_start_exhausts_search() {
    let robot = Gantry::new();
    let mut grid = gantry_grid();
    // Square enclosure around the origin.
    grid.add_box(WorldPoint::new(0.3, 0.0, 0.05), (0.1, 0.7, 0.1));
    grid.add_box(WorldPoint::new(-0.3, 0.0, 0.05), (0.1, 0.7, 0.1));
    grid.add_box(WorldPoint::new(0.0, 0.3, 0.05), (0.7, 0.1, 0.1));
    grid.add_box(WorldPoint::new(0.0, -0.3, 0.05), (0.7, 0.1, 0.1));

    let config = PlanningConfig::default();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, gantry_spheres(), config);

    // Goal is clear of the enclosure, but unreachable from inside it.
    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.8, 0.8], 0.05),
        budget(),
    );
    match planner.plan(&request) {
        Err(PlanningError::NoPathFound { expansions }) => assert!(expansions > 0),
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[test]
fn zero_time_budget_is_rejected() {
    let robot = Gantry::new();
    let grid = gantry_grid();
    let config = PlanningConfig::default();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, gantry_spheres(), config);

    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.5, 0.0], 0.05),
        Duration::ZERO,
    );
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::InvalidRequest(_))
    ));
}

#[test]
fn expired_budget_times_out_without_solution() {
    let robot = Gantry::new();
    let grid = gantry_grid();
    let config = PlanningConfig::default();
    let actions = UniformActionSet::new(robot.num_joints(), config.actions);
    let planner = PlannerInterface::new(&robot, &grid, &actions, gantry_spheres(), config);

    // A 1ns budget expires before the first expansion finishes.
    let request = PlanRequest::new(
        vec![0.0, 0.0],
        GoalSpec::configuration(vec![0.9, 0.9], 0.05),
        Duration::from_nanos(1),
    );
    assert!(matches!(
        planner.plan(&request),
        Err(PlanningError::TimedOut { .. })
    ));
}
