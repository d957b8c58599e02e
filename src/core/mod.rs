//! Core types for the motion planning library.
//!
//! This module provides the fundamental types used throughout the library:
//! - [`GridCoord`] and [`WorldPoint`]: grid and world coordinate types
//! - [`Pose3D`]: rigid-body pose (position + orientation)
//! - [`math`]: angle utilities for revolute joints

pub mod math;
mod point;
mod pose;

pub use point::{GridCoord, WorldPoint};
pub use pose::Pose3D;
