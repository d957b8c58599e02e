//! Occupancy grid wrapping the distance field.
//!
//! Adds world↔grid coordinate mapping, bounds checking, and
//! resolution-aware obstacle geometry (boxes, spheres, segments)
//! on top of [`DistanceField`].

use std::collections::HashSet;

use log::debug;

use crate::core::{GridCoord, WorldPoint};

use super::config::{GridConfig, GridConfigError};
use super::distance_field::DistanceField;

/// Workspace occupancy grid.
///
/// Owns the distance field exclusively. World↔grid mapping is an affine
/// transform from the configured origin and resolution, with the cell
/// center convention: cell (x, y, z) covers `origin + [x, x+1) * resolution`
/// per axis and maps back to its center.
#[derive(Clone, Debug)]
pub struct OccupancyGrid {
    field: DistanceField,
    origin: WorldPoint,
    resolution: f64,
    frame: String,
}

impl OccupancyGrid {
    /// Build a grid from a validated configuration.
    pub fn new(config: GridConfig) -> Result<Self, GridConfigError> {
        config.validate()?;
        let width = (config.size_x / config.resolution).ceil() as usize;
        let height = (config.size_y / config.resolution).ceil() as usize;
        let depth = (config.size_z / config.resolution).ceil() as usize;
        debug!(
            "[OccupancyGrid] {}x{}x{} cells at {:.3}m in frame '{}'",
            width, height, depth, config.resolution, config.frame
        );
        Ok(Self {
            field: DistanceField::new(
                width,
                height,
                depth,
                config.resolution,
                config.max_distance,
            ),
            origin: config.origin,
            resolution: config.resolution,
            frame: config.frame,
        })
    }

    /// Cell edge length in meters
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Propagation cap of the distance field in meters
    #[inline]
    pub fn max_distance(&self) -> f64 {
        self.field.max_distance()
    }

    /// Name of the world frame the grid is expressed in
    #[inline]
    pub fn frame(&self) -> &str {
        &self.frame
    }

    /// World coordinates of the minimum grid corner
    #[inline]
    pub fn origin(&self) -> WorldPoint {
        self.origin
    }

    /// Grid dimensions in cells (width, height, depth)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize, usize) {
        (self.field.width(), self.field.height(), self.field.depth())
    }

    /// Convert world coordinates to grid coordinates
    #[inline]
    pub fn world_to_grid(&self, point: WorldPoint) -> GridCoord {
        GridCoord::new(
            ((point.x - self.origin.x) / self.resolution).floor() as i32,
            ((point.y - self.origin.y) / self.resolution).floor() as i32,
            ((point.z - self.origin.z) / self.resolution).floor() as i32,
        )
    }

    /// Convert grid coordinates to world coordinates (cell center)
    #[inline]
    pub fn grid_to_world(&self, coord: GridCoord) -> WorldPoint {
        WorldPoint::new(
            self.origin.x + (coord.x as f64 + 0.5) * self.resolution,
            self.origin.y + (coord.y as f64 + 0.5) * self.resolution,
            self.origin.z + (coord.z as f64 + 0.5) * self.resolution,
        )
    }

    /// Check if grid coordinates are within bounds.
    ///
    /// Out of bounds is a distinct outcome from "in collision": callers
    /// must not fold the two together.
    #[inline]
    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        self.field.is_valid_coord(coord)
    }

    /// Check if a world point falls inside the grid
    #[inline]
    pub fn contains_world(&self, point: WorldPoint) -> bool {
        self.in_bounds(self.world_to_grid(point))
    }

    /// Distance to the nearest obstacle at grid coordinates (meters).
    /// `None` if out of bounds.
    #[inline]
    pub fn distance(&self, coord: GridCoord) -> Option<f64> {
        self.field.distance(coord)
    }

    /// Distance to the nearest obstacle at world coordinates (meters).
    /// `None` if the point is outside the grid.
    #[inline]
    pub fn distance_world(&self, point: WorldPoint) -> Option<f64> {
        self.field.distance(self.world_to_grid(point))
    }

    /// Whether the cell holds an obstacle
    #[inline]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.field.is_occupied(coord)
    }

    /// Number of obstacle cells
    pub fn occupied_count(&self) -> usize {
        self.field.occupied_count()
    }

    /// Insert an axis-aligned box obstacle.
    ///
    /// `extents` are full edge lengths in meters. Cells whose centers lie
    /// inside the box are marked occupied.
    pub fn add_box(&mut self, center: WorldPoint, extents: (f64, f64, f64)) {
        let cells = self.rasterize_box(center, extents);
        debug!("[OccupancyGrid] add_box: {} cells", cells.len());
        self.field.add_points(&cells);
    }

    /// Remove a previously inserted box obstacle.
    pub fn remove_box(&mut self, center: WorldPoint, extents: (f64, f64, f64)) {
        let cells = self.rasterize_box(center, extents);
        debug!("[OccupancyGrid] remove_box: {} cells", cells.len());
        self.field.remove_points(&cells);
    }

    /// Insert a sphere obstacle.
    pub fn add_sphere(&mut self, center: WorldPoint, radius: f64) {
        let cells = self.rasterize_sphere(center, radius);
        debug!("[OccupancyGrid] add_sphere: {} cells", cells.len());
        self.field.add_points(&cells);
    }

    /// Remove a previously inserted sphere obstacle.
    pub fn remove_sphere(&mut self, center: WorldPoint, radius: f64) {
        let cells = self.rasterize_sphere(center, radius);
        self.field.remove_points(&cells);
    }

    /// Insert a capsule obstacle: a segment swept with a radius.
    ///
    /// Sampled along the segment at half-resolution steps so no cell
    /// inside the capsule is skipped.
    pub fn add_segment(&mut self, from: WorldPoint, to: WorldPoint, radius: f64) {
        let cells = self.rasterize_segment(from, to, radius);
        debug!("[OccupancyGrid] add_segment: {} cells", cells.len());
        self.field.add_points(&cells);
    }

    /// Remove a previously inserted capsule obstacle.
    pub fn remove_segment(&mut self, from: WorldPoint, to: WorldPoint, radius: f64) {
        let cells = self.rasterize_segment(from, to, radius);
        self.field.remove_points(&cells);
    }

    /// Remove all obstacles.
    pub fn clear(&mut self) {
        self.field.clear();
    }

    fn rasterize_box(&self, center: WorldPoint, extents: (f64, f64, f64)) -> Vec<GridCoord> {
        let half = (extents.0 / 2.0, extents.1 / 2.0, extents.2 / 2.0);
        let min = self.world_to_grid(WorldPoint::new(
            center.x - half.0,
            center.y - half.1,
            center.z - half.2,
        ));
        let max = self.world_to_grid(WorldPoint::new(
            center.x + half.0,
            center.y + half.1,
            center.z + half.2,
        ));

        let mut cells = Vec::new();
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let coord = GridCoord::new(x, y, z);
                    if !self.in_bounds(coord) {
                        continue;
                    }
                    let c = self.grid_to_world(coord);
                    if (c.x - center.x).abs() <= half.0
                        && (c.y - center.y).abs() <= half.1
                        && (c.z - center.z).abs() <= half.2
                    {
                        cells.push(coord);
                    }
                }
            }
        }
        cells
    }

    fn rasterize_sphere(&self, center: WorldPoint, radius: f64) -> Vec<GridCoord> {
        let min = self.world_to_grid(WorldPoint::new(
            center.x - radius,
            center.y - radius,
            center.z - radius,
        ));
        let max = self.world_to_grid(WorldPoint::new(
            center.x + radius,
            center.y + radius,
            center.z + radius,
        ));

        let mut cells = Vec::new();
        for z in min.z..=max.z {
            for y in min.y..=max.y {
                for x in min.x..=max.x {
                    let coord = GridCoord::new(x, y, z);
                    if !self.in_bounds(coord) {
                        continue;
                    }
                    if self.grid_to_world(coord).distance(&center) <= radius {
                        cells.push(coord);
                    }
                }
            }
        }
        cells
    }

    fn rasterize_segment(&self, from: WorldPoint, to: WorldPoint, radius: f64) -> Vec<GridCoord> {
        let length = from.distance(&to);
        let steps = (length / (self.resolution * 0.5)).ceil().max(1.0) as usize;

        let mut seen = HashSet::new();
        let mut cells = Vec::new();
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            let sample = WorldPoint::new(
                from.x + (to.x - from.x) * t,
                from.y + (to.y - from.y) * t,
                from.z + (to.z - from.z) * t,
            );
            for coord in self.rasterize_sphere(sample, radius) {
                if seen.insert(coord) {
                    cells.push(coord);
                }
            }
        }
        cells
    }
}
