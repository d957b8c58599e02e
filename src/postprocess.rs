//! Trajectory post-processing.
//!
//! Lattice paths take axis-aligned joint steps; shortcutting replaces
//! stretches of waypoints with direct collision-valid motions, and
//! interpolation densifies the result for execution.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::collision::CollisionChecker;
use crate::robot::{interpolate, max_joint_distance, JointConfig, JointLimits};

/// Shortcutting settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortcutConfig {
    /// Enable shortcutting of planned paths
    #[serde(default = "defaults::enabled")]
    pub enabled: bool,
    /// Budget of edge validations spent on shortcutting
    #[serde(default = "defaults::max_checks")]
    pub max_checks: usize,
}

mod defaults {
    pub fn enabled() -> bool {
        true
    }

    pub fn max_checks() -> usize {
        1000
    }
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_checks: 1000,
        }
    }
}

/// Greedily replace waypoint stretches with direct valid motions.
///
/// From each kept waypoint, the farthest later waypoint reachable by a
/// single valid edge becomes the next one. Every replacement motion
/// passes the checker's edge validation, so the result is never less
/// safe than the input. Endpoints are always preserved.
pub fn shortcut_path(
    checker: &mut CollisionChecker<'_>,
    path: &[JointConfig],
    config: &ShortcutConfig,
) -> Vec<JointConfig> {
    if !config.enabled || path.len() <= 2 {
        return path.to_vec();
    }

    let mut checks = 0;
    let mut result = vec![path[0].clone()];
    let mut i = 0;
    while i + 1 < path.len() {
        let mut next = i + 1;
        let mut j = path.len() - 1;
        while j > i + 1 {
            if checks >= config.max_checks {
                break;
            }
            checks += 1;
            if checker.is_edge_valid(&path[i], &path[j]) {
                next = j;
                break;
            }
            j -= 1;
        }
        result.push(path[next].clone());
        i = next;
    }

    debug!(
        "[Shortcut] {} -> {} waypoints ({} edge checks)",
        path.len(),
        result.len(),
        checks
    );
    result
}

/// Densify a path so no joint moves more than `max_joint_step` between
/// consecutive points. Continuous joints interpolate along the shortest
/// angular arc.
pub fn interpolate_path(
    limits: &[JointLimits],
    path: &[JointConfig],
    max_joint_step: f64,
) -> Vec<JointConfig> {
    if path.len() < 2 {
        return path.to_vec();
    }

    let mut result = vec![path[0].clone()];
    for segment in path.windows(2) {
        let span = max_joint_distance(limits, &segment[0], &segment[1]);
        let steps = (span / max_joint_step).ceil().max(1.0) as usize;
        for i in 1..=steps {
            let t = i as f64 / steps as f64;
            result.push(interpolate(limits, &segment[0], &segment[1], t));
        }
    }
    result
}
