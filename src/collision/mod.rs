//! Robot collision model and checker.
//!
//! The robot body is approximated by spheres attached to links:
//!
//! - [`CollisionSphereModel`] / [`CollisionGroupModel`]: immutable
//!   per-link sphere definitions
//! - [`RobotCollisionState`]: lazily-updated world-space sphere centers
//!   for one configuration context
//! - [`CollisionChecker`]: sphere-vs-distance-field tests with a
//!   conservative effective radius and configurable edge validation

mod checker;
mod model;
mod state;

pub use checker::{CheckConfig, CollisionChecker, EdgeCheck, SphereCheck, StateCheck};
pub use model::{CollisionGroupModel, CollisionModelError, CollisionSphereModel};
pub use state::{CollisionSphereState, RobotCollisionState};
