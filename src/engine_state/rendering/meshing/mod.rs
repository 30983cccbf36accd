//! Surface extraction for chunk density grids.
//!
//! The terrain core treats iso-surface extraction as a pluggable primitive behind the
//! [`Mesher`] trait: it is handed a chunk's `size³` grid and the isolevel once per chunk
//! (re)generation and returns an opaque surface value.
//!
//! # Sign Convention
//! Chunk grids hold the negated density, so cells **above** the isolevel are inside the
//! extracted surface. [`SurfaceNetsMesher`] flips this back to the negative-inside signed
//! distance `fast-surface-nets` expects.

use cgmath::Point3;
use fast_surface_nets::{ndshape::RuntimeShape, surface_nets, SurfaceNetsBuffer};

use crate::{
    core::{Result, TerrainError},
    engine_state::voxels::chunk::{chunk_origin, grid_len},
};

/// Turns a chunk's density grid into a renderable surface.
pub trait Mesher {
    /// Surface type handed to the renderer.
    type Surface;

    /// Extracts the surface of the chunk at `position` from its grid.
    fn extract(
        &self,
        position: Point3<i32>,
        grid: &[f32],
        size: usize,
        isolevel: f32,
    ) -> Result<Self::Surface>;
}

/// Indexed triangle mesh of one chunk, in world space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkSurface {
    /// World position of the chunk's minimum corner
    pub origin: [f32; 3],
    /// Vertex positions, world space
    pub positions: Vec<[f32; 3]>,
    /// Unnormalized vertex normals
    pub normals: Vec<[f32; 3]>,
    /// Triangle list indices into `positions`
    pub indices: Vec<u32>,
}

impl ChunkSurface {
    /// Number of triangles in the surface.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Whether the chunk produced no geometry.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Default mesher built on naive surface nets.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfaceNetsMesher;

impl Mesher for SurfaceNetsMesher {
    type Surface = ChunkSurface;

    fn extract(
        &self,
        position: Point3<i32>,
        grid: &[f32],
        size: usize,
        isolevel: f32,
    ) -> Result<ChunkSurface> {
        let cells = grid_len(size);
        if grid.len() != cells {
            return Err(TerrainError::Mesher(format!(
                "grid has {} cells, expected {cells}",
                grid.len()
            )));
        }
        let origin = chunk_origin(position, size);
        let origin = [origin.x as f32, origin.y as f32, origin.z as f32];
        if size < 2 {
            return Ok(ChunkSurface {
                origin,
                ..ChunkSurface::default()
            });
        }

        let mut sdf = Vec::new();
        sdf.try_reserve_exact(cells)
            .map_err(|source| TerrainError::ResourceExhaustion { cells, source })?;
        sdf.extend(grid.iter().map(|value| isolevel - value));

        let edge = size as u32;
        let shape = RuntimeShape::<u32, 3>::new([edge, edge, edge]);
        let mut buffer = SurfaceNetsBuffer::default();
        surface_nets(&sdf, &shape, [0; 3], [edge - 1; 3], &mut buffer);

        let positions = buffer
            .positions
            .iter()
            .map(|[x, y, z]| [x + origin[0], y + origin[1], z + origin[2]])
            .collect();

        Ok(ChunkSurface {
            origin,
            positions,
            normals: buffer.normals,
            indices: buffer.indices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::cell_index;

    const SIZE: usize = 12;

    fn grid_with_ball(radius: f32) -> Vec<f32> {
        let mut grid = vec![0.0; SIZE * SIZE * SIZE];
        let center = (SIZE as f32 - 1.0) / 2.0;
        for z in 0..SIZE {
            for y in 0..SIZE {
                for x in 0..SIZE {
                    let d = ((x as f32 - center).powi(2)
                        + (y as f32 - center).powi(2)
                        + (z as f32 - center).powi(2))
                    .sqrt();
                    // Stored values are negated densities: positive inside the ball.
                    grid[cell_index(x, y, z, SIZE)] = radius - d;
                }
            }
        }
        grid
    }

    #[test]
    fn uniform_grid_has_no_surface() {
        let grid = vec![-5.0; SIZE * SIZE * SIZE];
        let surface = SurfaceNetsMesher
            .extract(Point3::new(0, 0, 0), &grid, SIZE, 0.0)
            .unwrap();
        assert!(surface.is_empty());
    }

    #[test]
    fn ball_produces_closed_surface_in_world_space() {
        let grid = grid_with_ball(4.0);
        let surface = SurfaceNetsMesher
            .extract(Point3::new(1, 0, -1), &grid, SIZE, 0.0)
            .unwrap();
        assert!(surface.triangle_count() > 0);
        assert_eq!(surface.origin, [12.0, 0.0, -12.0]);
        assert!(surface
            .positions
            .iter()
            .all(|p| p[0] >= 12.0 && p[0] <= 24.0 && p[2] >= -12.0 && p[2] <= 0.0));
    }

    #[test]
    fn mismatched_grid_is_rejected() {
        let result = SurfaceNetsMesher.extract(Point3::new(0, 0, 0), &[0.0; 8], SIZE, 0.0);
        assert!(matches!(result, Err(TerrainError::Mesher(_))));

        let result = SurfaceNetsMesher.extract(Point3::new(0, 0, 0), &[0.0; 8], 3_000_000, 0.0);
        assert!(matches!(result, Err(TerrainError::Mesher(_))));
    }
}
