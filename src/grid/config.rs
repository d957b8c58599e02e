//! Workspace grid configuration section.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::WorldPoint;

/// Workspace grid settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GridConfig {
    /// Workspace extent along X in meters
    #[serde(default = "defaults::size")]
    pub size_x: f64,
    /// Workspace extent along Y in meters
    #[serde(default = "defaults::size")]
    pub size_y: f64,
    /// Workspace extent along Z in meters
    #[serde(default = "defaults::size")]
    pub size_z: f64,
    /// World coordinates of the minimum grid corner
    #[serde(default = "defaults::origin")]
    pub origin: WorldPoint,
    /// Cell edge length in meters
    #[serde(default = "defaults::resolution")]
    pub resolution: f64,
    /// Maximum distance propagated through the field (meters).
    /// Cells farther than this from any obstacle report exactly this value.
    #[serde(default = "defaults::max_distance")]
    pub max_distance: f64,
    /// Name of the world frame the grid is expressed in
    #[serde(default = "defaults::frame")]
    pub frame: String,
}

mod defaults {
    use crate::core::WorldPoint;

    pub fn size() -> f64 {
        2.0
    }

    pub fn origin() -> WorldPoint {
        WorldPoint::new(-1.0, -1.0, -1.0)
    }

    pub fn resolution() -> f64 {
        0.02
    }

    pub fn max_distance() -> f64 {
        0.4
    }

    pub fn frame() -> String {
        "map".to_string()
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size_x: 2.0,  // 2m cube around the robot base
            size_y: 2.0,
            size_z: 2.0,
            origin: WorldPoint::new(-1.0, -1.0, -1.0),
            resolution: 0.02,  // 2cm voxels
            max_distance: 0.4, // largest sphere radius + padding expected
            frame: "map".to_string(),
        }
    }
}

/// Error validating a [`GridConfig`]
#[derive(Debug, Error, PartialEq)]
pub enum GridConfigError {
    #[error("grid resolution must be positive, got {0}")]
    NonPositiveResolution(f64),
    #[error("grid extent must be positive, got ({0}, {1}, {2})")]
    NonPositiveExtent(f64, f64, f64),
    #[error("max distance must be positive, got {0}")]
    NonPositiveMaxDistance(f64),
}

impl GridConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GridConfigError> {
        if self.resolution <= 0.0 {
            return Err(GridConfigError::NonPositiveResolution(self.resolution));
        }
        if self.size_x <= 0.0 || self.size_y <= 0.0 || self.size_z <= 0.0 {
            return Err(GridConfigError::NonPositiveExtent(
                self.size_x,
                self.size_y,
                self.size_z,
            ));
        }
        if self.max_distance <= 0.0 {
            return Err(GridConfigError::NonPositiveMaxDistance(self.max_distance));
        }
        Ok(())
    }
}
