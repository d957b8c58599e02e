//! Motion primitives and the action set contract.
//!
//! An action set turns a source configuration into candidate successor
//! configurations. The provided [`UniformActionSet`] applies fixed
//! per-joint deltas; long-range primitives are swapped for finer
//! short-range ones as the search closes in on the goal.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::robot::JointConfig;

/// Primitive range class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// Coarse motion used far from the goal
    Long,
    /// Fine motion used near the goal
    Short,
}

/// A joint-space motion delta.
#[derive(Clone, Debug, PartialEq)]
pub struct MotionPrimitive {
    /// Range class deciding when the primitive applies
    pub kind: PrimitiveKind,
    /// Per-joint displacement (radians), added to the source configuration
    pub delta: Vec<f64>,
}

impl MotionPrimitive {
    /// Create a primitive.
    pub fn new(kind: PrimitiveKind, delta: Vec<f64>) -> Self {
        Self { kind, delta }
    }

    /// Apply to a source configuration.
    pub fn apply(&self, from: &[f64]) -> JointConfig {
        from.iter()
            .zip(self.delta.iter())
            .map(|(&v, &d)| v + d)
            .collect()
    }
}

/// Supplier of candidate successor configurations.
///
/// Implementations must be deterministic: the same source configuration
/// and goal distance always yield the same candidates in the same order.
pub trait ActionSet {
    /// Candidate successor configurations of `from`.
    ///
    /// `goal_distance` is the caller's current estimate of remaining
    /// cost-to-goal in the same units the primitives move in (radians);
    /// `None` when no estimate is available.
    fn actions(&self, from: &[f64], goal_distance: Option<f64>) -> Vec<JointConfig>;
}

/// Settings for [`UniformActionSet`]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionSetConfig {
    /// Per-joint delta of long-range primitives (radians)
    #[serde(default = "defaults::long_delta")]
    pub long_delta: f64,
    /// Per-joint delta of short-range primitives (radians)
    #[serde(default = "defaults::short_delta")]
    pub short_delta: f64,
    /// Goal distance below which short-range primitives take over (radians)
    #[serde(default = "defaults::short_threshold")]
    pub short_threshold: f64,
}

mod defaults {
    pub fn long_delta() -> f64 {
        0.1
    }

    pub fn short_delta() -> f64 {
        0.02
    }

    pub fn short_threshold() -> f64 {
        0.2
    }
}

impl Default for ActionSetConfig {
    fn default() -> Self {
        Self {
            long_delta: 0.1,      // ~5.7 degrees
            short_delta: 0.02,    // ~1.1 degrees
            short_threshold: 0.2, // switch to fine motion within this goal distance
        }
    }
}

/// Fixed ±delta-per-joint action set.
///
/// Generates one long-range primitive pair per joint, plus a short-range
/// pair per joint that activates when the reported goal distance drops
/// below the threshold. Primitive order is (joint 0 +, joint 0 −,
/// joint 1 +, ...), long before short.
#[derive(Clone, Debug)]
pub struct UniformActionSet {
    primitives: Vec<MotionPrimitive>,
    config: ActionSetConfig,
}

impl UniformActionSet {
    /// Build primitives for a robot with `num_joints` joints.
    pub fn new(num_joints: usize, config: ActionSetConfig) -> Self {
        let mut primitives = Vec::with_capacity(num_joints * 4);
        for (kind, delta) in [
            (PrimitiveKind::Long, config.long_delta),
            (PrimitiveKind::Short, config.short_delta),
        ] {
            for joint in 0..num_joints {
                for sign in [1.0, -1.0] {
                    let mut step = vec![0.0; num_joints];
                    step[joint] = sign * delta;
                    primitives.push(MotionPrimitive::new(kind, step));
                }
            }
        }
        debug!(
            "[ActionSet] {} primitives for {} joints",
            primitives.len(),
            num_joints
        );
        Self { primitives, config }
    }

    /// With default settings.
    pub fn with_defaults(num_joints: usize) -> Self {
        Self::new(num_joints, ActionSetConfig::default())
    }

    /// All primitives, long-range first.
    pub fn primitives(&self) -> &[MotionPrimitive] {
        &self.primitives
    }
}

impl ActionSet for UniformActionSet {
    fn actions(&self, from: &[f64], goal_distance: Option<f64>) -> Vec<JointConfig> {
        let use_short = goal_distance.is_some_and(|d| d <= self.config.short_threshold);
        self.primitives
            .iter()
            .filter(|p| match p.kind {
                PrimitiveKind::Long => true,
                PrimitiveKind::Short => use_short,
            })
            .map(|p| p.apply(from))
            .collect()
    }
}
