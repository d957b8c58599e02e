//! # Bhuja-Plan: Collision-Aware Arm Motion Planning
//!
//! A motion planner for articulated robots: given a start configuration,
//! a goal (joint configuration or Cartesian pose), and a voxel model of
//! the obstacles, it searches a discretized configuration-space lattice
//! for a feasible, low-cost joint trajectory. The search is anytime: an
//! inflated heuristic produces a bounded-suboptimal solution quickly,
//! and remaining time is spent lowering the bound toward optimal.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use bhuja_plan::{
//!     GoalSpec, PlanRequest, PlannerInterface, PlanningConfig,
//!     OccupancyGrid, UniformActionSet,
//! };
//!
//! let config = PlanningConfig::default();
//! let mut grid = OccupancyGrid::new(config.grid.clone())?;
//! grid.add_box(table_center, table_extents);
//!
//! let actions = UniformActionSet::new(robot.num_joints(), config.actions);
//! let planner = PlannerInterface::new(&robot, &grid, &actions, spheres, config);
//!
//! let request = PlanRequest::new(
//!     start_configuration,
//!     GoalSpec::configuration(goal_configuration, 0.05),
//!     Duration::from_secs(1),
//! );
//! let result = planner.plan(&request)?;
//! println!("{} waypoints, cost {}", result.trajectory.points.len(), result.stats.solution_cost);
//! ```
//!
//! ## Architecture
//!
//! The library is organized into modules, collision feasibility flowing
//! bottom-up and the plan flowing top-down:
//!
//! - [`core`]: coordinate, pose, and angle types
//! - [`grid`]: voxel distance field and occupancy grid
//! - [`collision`]: sphere-based robot body model and checker
//! - [`robot`]: robot model collaborator contract
//! - [`action`]: motion primitives generating candidate successors
//! - [`lattice`]: configuration-space graph presented to the search
//! - [`search`]: anytime repairing A*
//! - [`postprocess`]: path shortcutting and interpolation
//! - [`interface`]: request validation, episode driving, trajectory extraction
//!
//! ## Data Flow
//!
//! ```text
//!   PlanRequest ──► PlannerInterface ──► ManipLattice ──► AraStar
//!                        │                    │              │
//!                        ▼                    ▼              ▼
//!                   validation         successors +     state path
//!                                      edge costs            │
//!                                           │                ▼
//!                   CollisionChecker ◄──────┘         JointTrajectory
//!                        │                              + PlanStats
//!                        ▼
//!                   OccupancyGrid ──► DistanceField
//! ```
//!
//! ## Concurrency
//!
//! A planning call is single-threaded and cooperative: the time budget
//! is polled between expansions, never preempted. Grid queries through
//! `&self` may run concurrently; obstacle updates need `&mut` and are
//! serialized by the borrow checker. Collision state caches are owned
//! per evaluation context; clone them instead of sharing.

pub mod action;
pub mod collision;
pub mod config;
pub mod core;
pub mod grid;
pub mod interface;
pub mod lattice;
pub mod postprocess;
pub mod robot;
pub mod search;

// Re-export the main types at the crate root
pub use action::{ActionSet, ActionSetConfig, MotionPrimitive, PrimitiveKind, UniformActionSet};
pub use collision::{
    CheckConfig, CollisionChecker, CollisionGroupModel, CollisionSphereModel, EdgeCheck,
    RobotCollisionState, SphereCheck, StateCheck,
};
pub use config::PlanningConfig;
pub use grid::{DistanceField, GridConfig, OccupancyGrid};
pub use interface::{
    JointTrajectory, PlanRequest, PlanResult, PlanStats, PlannerInterface, PlanningError,
};
pub use lattice::{GoalSpec, LatticeConfig, ManipLattice, StateId};
pub use robot::{JointConfig, JointLimits, RobotModel};
pub use search::{AraStar, SearchConfig, SearchFailure, SearchResult, SearchSpace};
