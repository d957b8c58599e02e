//! Per-configuration collision state.

use log::debug;

use crate::core::WorldPoint;
use crate::robot::{JointConfig, RobotModel};

use super::model::{CollisionGroupModel, CollisionSphereModel};

/// World-space state of one collision sphere.
#[derive(Clone, Debug)]
pub struct CollisionSphereState {
    /// The immutable sphere definition
    pub model: CollisionSphereModel,
    /// Last computed world-frame center
    pub center: WorldPoint,
    /// True until the center has been computed for the current configuration
    pub dirty: bool,
}

/// Collision state of the whole group for one configuration context.
///
/// A cache keyed by the last configuration used: presenting the same
/// configuration again is a no-op, presenting a different one recomputes
/// every sphere center through forward kinematics. The state is owned by
/// value by a single evaluator; clone it for concurrent evaluation
/// contexts instead of sharing.
#[derive(Clone, Debug)]
pub struct RobotCollisionState {
    spheres: Vec<CollisionSphereState>,
    last_config: Option<JointConfig>,
}

impl RobotCollisionState {
    /// Create a state for the group's spheres; all spheres start dirty.
    pub fn new(group: &CollisionGroupModel) -> Self {
        let spheres = group
            .spheres()
            .iter()
            .map(|model| CollisionSphereState {
                model: model.clone(),
                center: WorldPoint::ZERO,
                dirty: true,
            })
            .collect();
        Self {
            spheres,
            last_config: None,
        }
    }

    /// Sphere states in check order.
    pub fn spheres(&self) -> &[CollisionSphereState] {
        &self.spheres
    }

    /// Number of spheres.
    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    /// Whether the state has no spheres.
    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    /// The configuration the sphere centers were last computed for.
    pub fn last_config(&self) -> Option<&[f64]> {
        self.last_config.as_deref()
    }

    /// Refresh sphere centers for `config`.
    ///
    /// Skipped entirely when `config` matches the cached configuration.
    /// A sphere whose link cannot be resolved stays dirty and is treated
    /// as outside the monitored region by the checker.
    pub fn update(&mut self, robot: &dyn RobotModel, config: &[f64]) {
        if self
            .last_config
            .as_ref()
            .is_some_and(|last| last.as_slice() == config)
        {
            return;
        }

        for sphere in &mut self.spheres {
            match robot.forward_kinematics(config, &sphere.model.link) {
                Some(pose) => {
                    let center = pose.transform_point(sphere.model.offset);
                    sphere.center = WorldPoint::new(center.x, center.y, center.z);
                    sphere.dirty = false;
                }
                None => {
                    debug!(
                        "[CollisionState] no kinematics for link '{}' of sphere '{}'",
                        sphere.model.link, sphere.model.name
                    );
                    sphere.dirty = true;
                }
            }
        }
        self.last_config = Some(config.to_vec());
    }
}
