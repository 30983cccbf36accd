//! # Chunk Module
//!
//! This module provides the `Chunk` struct and the coordinate arithmetic shared by the
//! chunk store, the streaming controller and the walkability query.
//!
//! ## Coordinates
//!
//! A chunk is identified by an integer triple `(cx, cy, cz)` stored as `Point3<i32>`.
//! It covers the world-space cube `[c * size, (c + 1) * size)` on each axis, with one grid
//! cell per world unit.
//!
//! ## Grid Layout
//!
//! Cells are stored densely, x fastest:
//!
//! ```text
//! index = x + y * size + z * size²
//! ```

use cgmath::Point3;

pub mod chunk_creation;

/// A resident region of the world with its cached density grid and surface.
pub struct Chunk<S> {
    /// The position of this chunk in chunk coordinates (not world coordinates).
    pub position: Point3<i32>,
    /// Edge length of the grid.
    pub size: usize,
    /// Negated density samples, `size³` cells.
    pub grid: Vec<f32>,
    /// The renderable surface extracted from `grid`.
    pub surface: S,
}

impl<S> Chunk<S> {
    /// Stored (negated) density of a cell, `None` outside the grid.
    pub fn value_at(&self, x: usize, y: usize, z: usize) -> Option<f32> {
        if x >= self.size || y >= self.size || z >= self.size {
            return None;
        }
        self.grid.get(cell_index(x, y, z, self.size)).copied()
    }

    /// World position of the cell at grid index `index`.
    pub fn world_position_of(&self, index: usize) -> Point3<f64> {
        let size = self.size;
        let origin = chunk_origin(self.position, size);
        Point3::new(
            origin.x + (index % size) as f64,
            origin.y + ((index / size) % size) as f64,
            origin.z + (index / (size * size)) as f64,
        )
    }
}

/// Number of cells in a `size³` grid, saturating at `usize::MAX`.
pub fn grid_len(size: usize) -> usize {
    size.checked_mul(size)
        .and_then(|plane| plane.checked_mul(size))
        .unwrap_or(usize::MAX)
}

/// Linear index of a local cell.
pub fn cell_index(x: usize, y: usize, z: usize, size: usize) -> usize {
    x + y * size + z * size * size
}

/// World position of the chunk's minimum corner.
pub fn chunk_origin(position: Point3<i32>, size: usize) -> Point3<f64> {
    let size = size as f64;
    Point3::new(
        position.x as f64 * size,
        position.y as f64 * size,
        position.z as f64 * size,
    )
}

/// Chunk containing a world point, `floor(point / size)` per axis.
///
/// Coordinates beyond the `i32` range saturate; use [`chunk_position_in_range`] to reject them.
pub fn chunk_position_of(point: Point3<f64>, size: usize) -> Point3<i32> {
    let size = size as f64;
    Point3::new(
        (point.x / size).floor() as i32,
        (point.y / size).floor() as i32,
        (point.z / size).floor() as i32,
    )
}

/// Chunk containing a world point, or `None` when the point is non-finite or its chunk
/// lies within `margin` chunks of the `i32` limits.
pub fn chunk_position_in_range(point: Point3<f64>, size: usize, margin: i32) -> Option<Point3<i32>> {
    let limit = f64::from(i32::MAX.saturating_sub(margin.max(0)));
    let size = size as f64;
    let axis = |value: f64| {
        let chunk = (value / size).floor();
        (chunk.is_finite() && chunk.abs() <= limit).then_some(chunk as i32)
    };
    Some(Point3::new(axis(point.x)?, axis(point.y)?, axis(point.z)?))
}

/// Largest per-axis distance between two chunk positions, saturating at `i32::MAX`.
pub fn chebyshev_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    let d = a.x.abs_diff(b.x).max(a.y.abs_diff(b.y)).max(a.z.abs_diff(b.z));
    i32::try_from(d).unwrap_or(i32::MAX)
}

/// Sum of per-axis distances between two chunk positions, saturating at `i32::MAX`.
pub fn manhattan_distance(a: Point3<i32>, b: Point3<i32>) -> i32 {
    let d = u64::from(a.x.abs_diff(b.x)) + u64::from(a.y.abs_diff(b.y)) + u64::from(a.z.abs_diff(b.z));
    i32::try_from(d).unwrap_or(i32::MAX)
}

/// All chunk positions within Chebyshev distance `radius` of `center`, a `(2r + 1)³` cube.
///
/// Positions that would leave the `i32` range are skipped.
pub fn neighborhood(center: Point3<i32>, radius: i32) -> impl Iterator<Item = Point3<i32>> {
    let offsets = move |c: i32| (-radius..=radius).filter_map(move |d| c.checked_add(d));
    offsets(center.z).flat_map(move |z| {
        offsets(center.y).flat_map(move |y| offsets(center.x).map(move |x| Point3::new(x, y, z)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_position_floors_negative_coordinates() {
        assert_eq!(chunk_position_of(Point3::new(0.0, 63.9, 64.0), 64), Point3::new(0, 0, 1));
        assert_eq!(chunk_position_of(Point3::new(-0.1, -64.0, -64.5), 64), Point3::new(-1, -1, -2));
    }

    #[test]
    fn neighborhood_is_a_full_cube() {
        let cells: Vec<_> = neighborhood(Point3::new(2, -3, 0), 1).collect();
        assert_eq!(cells.len(), 27);
        assert!(cells.contains(&Point3::new(1, -4, -1)));
        assert!(cells.contains(&Point3::new(3, -2, 1)));
        assert!(cells
            .iter()
            .all(|c| chebyshev_distance(*c, Point3::new(2, -3, 0)) <= 1));
        assert_eq!(neighborhood(Point3::new(0, 0, 0), 0).count(), 1);
    }

    #[test]
    fn coordinates_near_i32_limits_do_not_overflow() {
        let edge = Point3::new(i32::MAX, i32::MIN, 0);
        let cells: Vec<_> = neighborhood(edge, 1).collect();
        assert_eq!(cells.len(), 2 * 2 * 3);
        assert_eq!(manhattan_distance(edge, Point3::new(i32::MIN, i32::MAX, 0)), i32::MAX);
        assert_eq!(chebyshev_distance(edge, Point3::new(0, 0, 0)), i32::MAX);
    }

    #[test]
    fn out_of_range_points_have_no_chunk() {
        assert_eq!(
            chunk_position_in_range(Point3::new(-0.5, 64.0, 127.0), 64, 5),
            Some(Point3::new(-1, 1, 1))
        );
        assert_eq!(chunk_position_in_range(Point3::new(1e300, 0.0, 0.0), 64, 5), None);
        assert_eq!(chunk_position_in_range(Point3::new(0.0, f64::NAN, 0.0), 64, 5), None);
        let edge = i32::MAX as f64 * 64.0;
        assert_eq!(chunk_position_in_range(Point3::new(0.0, 0.0, edge), 64, 5), None);
    }

    #[test]
    fn distances() {
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, -1, 1);
        assert_eq!(chebyshev_distance(a, b), 1);
        assert_eq!(manhattan_distance(a, b), 3);
    }

    #[test]
    fn cell_world_position_inverts_index() {
        let chunk = Chunk {
            position: Point3::new(-1, 2, 0),
            size: 4,
            grid: vec![0.0; 64],
            surface: (),
        };
        let index = cell_index(3, 1, 2, 4);
        assert_eq!(chunk.world_position_of(index), Point3::new(-1.0, 9.0, 2.0));
        assert_eq!(chunk.value_at(4, 0, 0), None);
        assert_eq!(chunk.value_at(3, 3, 3), Some(0.0));
    }
}
