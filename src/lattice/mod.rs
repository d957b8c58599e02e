//! Configuration-space lattice.
//!
//! Maps joint configurations to integer state ids and presents the
//! resulting graph to the search:
//!
//! - [`ManipLattice`]: state interning, successor generation through the
//!   action set, collision-validated edges, heuristic and goal test
//! - [`GoalSpec`]: joint-configuration and Cartesian-pose goals

mod environment;
mod goal;

pub use environment::{LatticeConfig, ManipLattice, StateId};
pub use goal::{GoalError, GoalSpec};
