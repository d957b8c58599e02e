//! Workspace occupancy grid and distance field.
//!
//! This module provides the spatial index the collision checker queries:
//!
//! - [`DistanceField`]: voxel grid of distances to the nearest obstacle,
//!   updated incrementally by brushfire propagation
//! - [`OccupancyGrid`]: world↔grid mapping, bounds checking, and
//!   resolution-aware obstacle geometry on top of the field

mod config;
mod distance_field;
mod occupancy;

pub use config::{GridConfig, GridConfigError};
pub use distance_field::DistanceField;
pub use occupancy::OccupancyGrid;
