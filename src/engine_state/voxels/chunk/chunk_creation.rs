//! # Chunk Creation Module
//!
//! Fills the dense density grid of a chunk.
//!
//! Every cell stores the **negated** field sample, so the mesher's "inside" (values above
//! the isolevel) lines up with the field's carved and tunnel space. Cells are laid out
//! `x + y * size + z * size²`.
//!
//! Z-slices are independent, so the grid is filled slice-parallel with rayon. The whole
//! fill still happens inside a single call, so a coordinate is never generated twice at
//! once and no caller ever observes a partially filled grid.

use cgmath::Point3;
use rayon::prelude::*;

use crate::{
    core::{Result, TerrainError},
    engine_state::voxels::{carve::CarveSphere, density::DensityField},
};

use super::{chunk_origin, grid_len};

/// Allocates and fills the grid for the chunk at `position`.
///
/// # Errors
/// Returns `TerrainError::ResourceExhaustion` when the grid cannot be allocated.
pub fn sample_grid(
    position: Point3<i32>,
    size: usize,
    field: &DensityField,
    carves: &[CarveSphere],
) -> Result<Vec<f32>> {
    let cells = grid_len(size);

    let mut grid = Vec::new();
    grid.try_reserve_exact(cells)
        .map_err(|source| TerrainError::ResourceExhaustion { cells, source })?;
    grid.resize(cells, 0.0f32);

    let plane = size * size;

    let origin = chunk_origin(position, size);

    grid.par_chunks_mut(plane)
        .enumerate()
        .for_each(|(z, slice)| {
            let wz = origin.z + z as f64;
            for y in 0..size {
                let wy = origin.y + y as f64;
                let row = &mut slice[y * size..(y + 1) * size];
                for (x, cell) in row.iter_mut().enumerate() {
                    let world = Point3::new(origin.x + x as f64, wy, wz);
                    *cell = -(field.sample(world, carves) as f32);
                }
            }
        });

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application_state::config::TerrainConfig, engine_state::voxels::chunk::cell_index,
    };

    #[test]
    fn grid_matches_negated_samples() {
        let field = DensityField::new(&TerrainConfig::default());
        let carves = [CarveSphere::new(Point3::new(-3.0, 5.0, 2.0), 2.5)];
        let position = Point3::new(-1, 0, 0);
        let size = 6;

        let grid = sample_grid(position, size, &field, &carves).unwrap();
        assert_eq!(grid.len(), size * size * size);

        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    let world = Point3::new(
                        (x as i32 - 6) as f64,
                        y as f64,
                        z as f64,
                    );
                    let expected = -(field.sample(world, &carves) as f32);
                    assert_eq!(grid[cell_index(x, y, z, size)], expected);
                }
            }
        }
    }

    #[test]
    fn oversized_grid_is_resource_exhaustion() {
        let field = DensityField::new(&TerrainConfig::default());
        let result = sample_grid(Point3::new(0, 0, 0), 3_000_000, &field, &[]);
        assert!(matches!(
            result,
            Err(TerrainError::ResourceExhaustion { cells: usize::MAX, .. })
        ));
    }
}
