//! Voxel distance field.
//!
//! Stores, per cell, the propagated distance to the nearest occupied cell.
//! Distances are relaxed outward from obstacle cells over the 26-connected
//! neighborhood with metric edge lengths, and capped at a configured
//! maximum: cells farther than the cap from every obstacle report exactly
//! the cap, never infinity.

use std::collections::{HashSet, VecDeque};

use log::trace;

use crate::core::GridCoord;

/// 3-D voxel grid of distances to the nearest occupied cell.
///
/// Storage is a flat array indexed `x + width * (y + height * z)`.
/// Queries through `&self` are safe to run concurrently; all mutation
/// goes through `&mut self` and must be serialized by the owner.
#[derive(Clone, Debug)]
pub struct DistanceField {
    /// Distance to nearest occupied cell, in meters, capped at `max_distance`
    distances: Vec<f64>,
    /// Obstacle occupancy per cell
    occupied: Vec<bool>,
    /// Grid width in cells (X)
    width: usize,
    /// Grid height in cells (Y)
    height: usize,
    /// Grid depth in cells (Z)
    depth: usize,
    /// Cell edge length in meters
    resolution: f64,
    /// Propagation cap in meters
    max_distance: f64,
}

impl DistanceField {
    /// Create an empty field; every cell reports `max_distance`.
    pub fn new(
        width: usize,
        height: usize,
        depth: usize,
        resolution: f64,
        max_distance: f64,
    ) -> Self {
        let size = width * height * depth;
        Self {
            distances: vec![max_distance; size],
            occupied: vec![false; size],
            width,
            height,
            depth,
            resolution,
            max_distance,
        }
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Grid depth in cells
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Cell edge length in meters
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Propagation cap in meters
    #[inline]
    pub fn max_distance(&self) -> f64 {
        self.max_distance
    }

    /// Check if grid coordinates are within bounds
    #[inline]
    pub fn is_valid_coord(&self, coord: GridCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && coord.z >= 0
            && (coord.x as usize) < self.width
            && (coord.y as usize) < self.height
            && (coord.z as usize) < self.depth
    }

    /// Convert grid coordinates to flat array index
    #[inline]
    pub fn coord_to_index(&self, coord: GridCoord) -> Option<usize> {
        if self.is_valid_coord(coord) {
            Some(
                coord.x as usize
                    + self.width * (coord.y as usize + self.height * coord.z as usize),
            )
        } else {
            None
        }
    }

    /// Convert flat array index to grid coordinates
    #[inline]
    pub fn index_to_coord(&self, index: usize) -> GridCoord {
        let x = index % self.width;
        let y = (index / self.width) % self.height;
        let z = index / (self.width * self.height);
        GridCoord::new(x as i32, y as i32, z as i32)
    }

    /// Distance to the nearest occupied cell (meters), `None` if out of bounds.
    ///
    /// Occupied cells report 0. Cells beyond the propagation cap report
    /// exactly `max_distance`.
    #[inline]
    pub fn distance(&self, coord: GridCoord) -> Option<f64> {
        self.coord_to_index(coord).map(|i| self.distances[i])
    }

    /// Whether the cell is an obstacle cell. Out of bounds reports false.
    #[inline]
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.coord_to_index(coord)
            .map(|i| self.occupied[i])
            .unwrap_or(false)
    }

    /// Number of occupied cells
    pub fn occupied_count(&self) -> usize {
        self.occupied.iter().filter(|&&o| o).count()
    }

    /// Mark cells occupied and propagate distances outward.
    ///
    /// Out-of-bounds coordinates are ignored. Already-occupied cells are
    /// re-seeded harmlessly.
    pub fn add_points(&mut self, points: &[GridCoord]) {
        let mut queue = VecDeque::with_capacity(points.len() * 4);

        for &coord in points {
            if let Some(idx) = self.coord_to_index(coord) {
                self.occupied[idx] = true;
                self.distances[idx] = 0.0;
                queue.push_back((coord, 0.0f64));
            }
        }

        trace!("[DistanceField] add_points: {} seeds", queue.len());
        self.propagate(queue);
    }

    /// Remove obstacle cells and repair the field incrementally.
    ///
    /// Every cell whose stored distance may have derived from a removed
    /// cell lies within `max_distance` (propagation metric) of it. That
    /// region is reset and re-relaxed from the surviving occupied cells
    /// inside it and from the valid cells on its rim.
    pub fn remove_points(&mut self, points: &[GridCoord]) {
        let mut sources = Vec::new();
        for &coord in points {
            if let Some(idx) = self.coord_to_index(coord) {
                if self.occupied[idx] {
                    self.occupied[idx] = false;
                    sources.push(coord);
                }
            }
        }
        if sources.is_empty() {
            return;
        }

        // Collect the affected region: BFS ball of radius max_distance
        // around the removed sources, in the same metric as propagation.
        let steps = self.neighbor_steps();
        let mut region: HashSet<usize> = HashSet::new();
        let mut frontier = VecDeque::new();
        for &coord in &sources {
            if let Some(idx) = self.coord_to_index(coord) {
                if region.insert(idx) {
                    frontier.push_back((coord, 0.0f64));
                }
            }
        }
        while let Some((coord, travel)) = frontier.pop_front() {
            for (dx, dy, dz, step) in steps {
                let neighbor = coord.offset(dx, dy, dz);
                let new_travel = travel + step;
                if new_travel > self.max_distance {
                    continue;
                }
                if let Some(idx) = self.coord_to_index(neighbor) {
                    if region.insert(idx) {
                        frontier.push_back((neighbor, new_travel));
                    }
                }
            }
        }

        // Reset the region, keeping surviving obstacles as zero-distance seeds.
        let mut queue = VecDeque::new();
        for &idx in &region {
            if self.occupied[idx] {
                self.distances[idx] = 0.0;
                queue.push_back((self.index_to_coord(idx), 0.0f64));
            } else {
                self.distances[idx] = self.max_distance;
            }
        }

        // Seed from the rim: cells just outside the region hold valid
        // distances and relax back into it.
        for &idx in &region {
            let coord = self.index_to_coord(idx);
            for (dx, dy, dz, _) in steps {
                let neighbor = coord.offset(dx, dy, dz);
                if let Some(nidx) = self.coord_to_index(neighbor) {
                    if !region.contains(&nidx) && self.distances[nidx] < self.max_distance {
                        queue.push_back((neighbor, self.distances[nidx]));
                    }
                }
            }
        }

        trace!(
            "[DistanceField] remove_points: {} removed, region {} cells, {} seeds",
            sources.len(),
            region.len(),
            queue.len()
        );
        self.propagate(queue);
    }

    /// Recompute the whole field from the occupied set.
    ///
    /// Slow fallback and correctness oracle for the incremental updates.
    pub fn recompute(&mut self) {
        self.distances.fill(self.max_distance);

        let mut queue = VecDeque::new();
        for idx in 0..self.occupied.len() {
            if self.occupied[idx] {
                self.distances[idx] = 0.0;
                queue.push_back((self.index_to_coord(idx), 0.0f64));
            }
        }
        self.propagate(queue);
    }

    /// Clear all obstacles; every cell reports `max_distance` again.
    pub fn clear(&mut self) {
        self.occupied.fill(false);
        self.distances.fill(self.max_distance);
    }

    /// 26-connected neighbor offsets with metric step lengths.
    fn neighbor_steps(&self) -> [(i32, i32, i32, f64); 26] {
        let r = self.resolution;
        let face = r * std::f64::consts::SQRT_2;
        let corner = r * 3.0f64.sqrt();
        let mut steps = [(0, 0, 0, 0.0); 26];
        let mut i = 0;
        for dz in -1i32..=1 {
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let step = match dx.abs() + dy.abs() + dz.abs() {
                        1 => r,
                        2 => face,
                        _ => corner,
                    };
                    steps[i] = (dx, dy, dz, step);
                    i += 1;
                }
            }
        }
        steps
    }

    /// Relax distances outward from the queued seeds.
    ///
    /// Monotone: only ever lowers a stored distance, so seeding with
    /// already-consistent cells is harmless.
    fn propagate(&mut self, mut queue: VecDeque<(GridCoord, f64)>) {
        let steps = self.neighbor_steps();
        while let Some((coord, dist)) = queue.pop_front() {
            for (dx, dy, dz, step) in steps {
                let neighbor = coord.offset(dx, dy, dz);
                let new_dist = dist + step;
                if new_dist > self.max_distance {
                    continue;
                }
                if let Some(idx) = self.coord_to_index(neighbor) {
                    if new_dist < self.distances[idx] {
                        self.distances[idx] = new_dist;
                        queue.push_back((neighbor, new_dist));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn create_test_field() -> DistanceField {
        // 10cm cells, 1m cube, 30cm cap
        DistanceField::new(10, 10, 10, 0.1, 0.3)
    }

    #[test]
    fn test_empty_field_reports_cap() {
        let field = create_test_field();
        assert_relative_eq!(field.distance(GridCoord::new(5, 5, 5)).unwrap(), 0.3);
        assert_eq!(field.distance(GridCoord::new(10, 0, 0)), None);
        assert_eq!(field.occupied_count(), 0);
    }

    #[test]
    fn test_index_round_trip() {
        let field = create_test_field();
        let coord = GridCoord::new(3, 7, 9);
        let idx = field.coord_to_index(coord).unwrap();
        assert_eq!(field.index_to_coord(idx), coord);
    }

    #[test]
    fn test_add_point_propagates() {
        let mut field = create_test_field();
        field.add_points(&[GridCoord::new(5, 5, 5)]);

        assert_relative_eq!(field.distance(GridCoord::new(5, 5, 5)).unwrap(), 0.0);
        assert!(field.is_occupied(GridCoord::new(5, 5, 5)));
        // One axis step away
        assert_relative_eq!(field.distance(GridCoord::new(6, 5, 5)).unwrap(), 0.1);
        // Face diagonal
        assert_relative_eq!(
            field.distance(GridCoord::new(6, 6, 5)).unwrap(),
            0.1 * std::f64::consts::SQRT_2,
            epsilon = 1e-12
        );
        // Beyond the cap
        assert_relative_eq!(field.distance(GridCoord::new(5, 5, 0)).unwrap(), 0.3);
    }

    #[test]
    fn test_distance_never_increases_on_insert() {
        let mut field = create_test_field();
        field.add_points(&[GridCoord::new(2, 5, 5)]);
        let before = field.distance(GridCoord::new(5, 5, 5)).unwrap();
        field.add_points(&[GridCoord::new(7, 5, 5)]);
        let after = field.distance(GridCoord::new(5, 5, 5)).unwrap();
        assert!(after <= before);
    }

    #[test]
    fn test_remove_matches_recompute() {
        let mut field = create_test_field();
        field.add_points(&[
            GridCoord::new(2, 2, 2),
            GridCoord::new(7, 7, 7),
            GridCoord::new(2, 7, 4),
        ]);
        field.remove_points(&[GridCoord::new(7, 7, 7)]);

        let mut oracle = field.clone();
        oracle.recompute();

        for idx in 0..1000 {
            let coord = field.index_to_coord(idx);
            assert_relative_eq!(
                field.distance(coord).unwrap(),
                oracle.distance(coord).unwrap(),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_remove_all_restores_empty() {
        let mut field = create_test_field();
        let points = [GridCoord::new(4, 4, 4), GridCoord::new(5, 4, 4)];
        field.add_points(&points);
        field.remove_points(&points);

        assert_eq!(field.occupied_count(), 0);
        for idx in 0..1000 {
            let coord = field.index_to_coord(idx);
            assert_relative_eq!(field.distance(coord).unwrap(), 0.3);
        }
    }

    #[test]
    fn test_remove_keeps_surviving_obstacle() {
        let mut field = create_test_field();
        field.add_points(&[GridCoord::new(4, 4, 4), GridCoord::new(5, 4, 4)]);
        field.remove_points(&[GridCoord::new(5, 4, 4)]);

        assert!(field.is_occupied(GridCoord::new(4, 4, 4)));
        assert_relative_eq!(field.distance(GridCoord::new(4, 4, 4)).unwrap(), 0.0);
        assert_relative_eq!(field.distance(GridCoord::new(5, 4, 4)).unwrap(), 0.1);
    }

    #[test]
    fn test_clear() {
        let mut field = create_test_field();
        field.add_points(&[GridCoord::new(5, 5, 5)]);
        field.clear();
        assert_eq!(field.occupied_count(), 0);
        assert_relative_eq!(field.distance(GridCoord::new(5, 5, 5)).unwrap(), 0.3);
    }
}
