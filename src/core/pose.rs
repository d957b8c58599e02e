//! 3-D rigid-body pose.

use nalgebra::{UnitQuaternion, Vector3};

use super::point::WorldPoint;

/// Rigid-body pose in the world frame (position + orientation).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose3D {
    /// Position in meters.
    pub position: Vector3<f64>,
    /// Orientation as a unit quaternion.
    pub orientation: UnitQuaternion<f64>,
}

impl Pose3D {
    /// Create a pose from position and orientation.
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Identity pose (origin, no rotation).
    pub fn identity() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Pure translation pose.
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            orientation: UnitQuaternion::identity(),
        }
    }

    /// Pose from position and ZYX Euler angles (roll about X, pitch about Y, yaw about Z).
    pub fn from_euler(position: Vector3<f64>, roll: f64, pitch: f64, yaw: f64) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::from_euler_angles(roll, pitch, yaw),
        }
    }

    /// Transform a point given in this pose's local frame into the world frame.
    #[inline]
    pub fn transform_point(&self, local: Vector3<f64>) -> Vector3<f64> {
        self.orientation * local + self.position
    }

    /// Compose with another pose: `self * other` (other expressed in self's frame).
    pub fn compose(&self, other: &Pose3D) -> Pose3D {
        Pose3D {
            position: self.transform_point(other.position),
            orientation: self.orientation * other.orientation,
        }
    }

    /// Position as a [`WorldPoint`].
    #[inline]
    pub fn world_point(&self) -> WorldPoint {
        WorldPoint::new(self.position.x, self.position.y, self.position.z)
    }

    /// Straight-line distance between the positions of two poses.
    #[inline]
    pub fn translation_distance(&self, other: &Pose3D) -> f64 {
        (self.position - other.position).norm()
    }

    /// Rotation angle (radians) between the orientations of two poses.
    #[inline]
    pub fn angular_distance(&self, other: &Pose3D) -> f64 {
        self.orientation.angle_to(&other.orientation)
    }
}

impl Default for Pose3D {
    fn default() -> Self {
        Self::identity()
    }
}
