//! Immutable collision geometry for the robot body.
//!
//! The robot is approximated by spheres attached to links. Models are
//! built once when the planning group is configured and never mutated;
//! the per-configuration world positions live in
//! [`RobotCollisionState`](super::RobotCollisionState).

use nalgebra::Vector3;
use thiserror::Error;

use crate::robot::RobotModel;

/// Sphere attached to a robot link, in the link's local frame.
#[derive(Clone, Debug)]
pub struct CollisionSphereModel {
    /// Sphere name, unique within its group
    pub name: String,
    /// Link the sphere is rigidly attached to
    pub link: String,
    /// Center offset in the link frame (meters)
    pub offset: Vector3<f64>,
    /// Sphere radius (meters)
    pub radius: f64,
}

impl CollisionSphereModel {
    /// Create a sphere model.
    pub fn new(name: impl Into<String>, link: impl Into<String>, offset: Vector3<f64>, radius: f64) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
            offset,
            radius,
        }
    }
}

/// Error building or validating a collision group.
#[derive(Debug, Error)]
pub enum CollisionModelError {
    #[error("sphere '{sphere}' is attached to unknown link '{link}'")]
    UnknownLink { sphere: String, link: String },
    #[error("sphere '{sphere}' has non-positive radius {radius}")]
    BadRadius { sphere: String, radius: f64 },
}

/// The set of collision spheres for one planning group.
///
/// Sphere order is the declaration order and is the order checks run in,
/// so putting likely-colliding spheres first speeds up rejection.
#[derive(Clone, Debug)]
pub struct CollisionGroupModel {
    name: String,
    spheres: Vec<CollisionSphereModel>,
}

impl CollisionGroupModel {
    /// Create a group from sphere models.
    pub fn new(name: impl Into<String>, spheres: Vec<CollisionSphereModel>) -> Self {
        Self {
            name: name.into(),
            spheres,
        }
    }

    /// Group name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sphere models in check order
    pub fn spheres(&self) -> &[CollisionSphereModel] {
        &self.spheres
    }

    /// Number of spheres
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Whether the group has no spheres
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// Check every sphere against the robot model: links must resolve
    /// through forward kinematics and radii must be positive.
    pub fn validate(&self, robot: &dyn RobotModel) -> Result<(), CollisionModelError> {
        let zero = vec![0.0; robot.num_joints()];
        for sphere in &self.spheres {
            if sphere.radius <= 0.0 {
                return Err(CollisionModelError::BadRadius {
                    sphere: sphere.name.clone(),
                    radius: sphere.radius,
                });
            }
            if robot.forward_kinematics(&zero, &sphere.link).is_none() {
                return Err(CollisionModelError::UnknownLink {
                    sphere: sphere.name.clone(),
                    link: sphere.link.clone(),
                });
            }
        }
        Ok(())
    }
}
