//! # Walkability Query
//!
//! Movement gate answering whether the observer may occupy a world point, read from the
//! precomputed grid of the chunk containing it.
//!
//! The query is conservative: a point in a chunk that is not resident, or one whose cell
//! cannot be resolved, is never walkable. It has no side effects and is cheap enough to
//! run every movement tick.

use cgmath::Point3;

use crate::engine_state::rendering::meshing::Mesher;

use super::{chunk::chunk_position_of, world::ChunkStore};

/// Local cell index of a world coordinate, wrapped into `[0, size)` for negative values.
fn local_cell(coordinate: f64, size: usize) -> Option<usize> {
    let floored = coordinate.floor();
    if !floored.is_finite() {
        return None;
    }
    let size = size as i64;
    let local = ((floored as i64 % size) + size) % size;
    usize::try_from(local).ok()
}

/// Whether `point` lies in a resident chunk at a cell whose stored value is below the isolevel.
pub fn is_walkable<M: Mesher>(store: &ChunkStore<M>, point: Point3<f64>) -> bool {
    let size = store.size();
    let Some(chunk) = store.get(chunk_position_of(point, size)) else {
        return false;
    };

    let (Some(x), Some(y), Some(z)) = (
        local_cell(point.x, size),
        local_cell(point.y, size),
        local_cell(point.z, size),
    ) else {
        return false;
    };

    chunk
        .value_at(x, y, z)
        .is_some_and(|value| value < store.isolevel())
}
