//! # Mining
//!
//! The only operation that changes terrain after generation. A mining action fires a ray
//! from the observer, drops a carve sphere at every step, persists the ledger once, and
//! invalidates the neighborhood around the ray's origin so affected chunks are regenerated
//! with the new carves on the next streaming tick.
//!
//! The neighborhood is at least the streaming load radius and always wide enough to
//! cover every chunk the ray's spheres can touch, so no resident chunk keeps a stale grid.

use cgmath::{InnerSpace, Point3, Vector3};
use log::info;

use crate::{
    application_state::{config::CarveConfig, persistence::Storage},
    core::Result,
    engine_state::rendering::meshing::Mesher,
};

use super::{
    carve::{CarveLedger, CarveSphere},
    chunk::{chebyshev_distance, chunk_position_of},
    world::ChunkStore,
};

/// Fires carve rays into the terrain.
#[derive(Debug, Clone)]
pub struct MiningOperation {
    steps: usize,
    spacing: f64,
    radius: f64,
    neighborhood_radius: i32,
}

impl MiningOperation {
    /// Creates a mining operation for chunks of edge `chunk_size`.
    ///
    /// Chunks are invalidated within `load_radius` of the ray origin's chunk, widened to
    /// the carve reach `steps * spacing + radius` when that extends further.
    pub fn new(config: &CarveConfig, load_radius: i32, chunk_size: usize) -> Self {
        let reach = config.steps as f64 * config.spacing + config.radius;
        let reach_chunks = (reach / chunk_size.max(1) as f64).ceil();
        let reach_chunks = if reach_chunks.is_finite() {
            reach_chunks.clamp(0.0, i32::MAX as f64) as i32
        } else {
            i32::MAX
        };
        Self {
            steps: config.steps,
            spacing: config.spacing,
            radius: config.radius,
            neighborhood_radius: load_radius.max(reach_chunks),
        }
    }

    /// Chebyshev radius, in chunks, invalidated around the ray origin.
    pub fn neighborhood_radius(&self) -> i32 {
        self.neighborhood_radius
    }

    /// Sphere centers along the ray, one every `spacing` units starting one step out.
    pub fn ray_points(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
    ) -> impl Iterator<Item = Point3<f64>> {
        let direction = if direction.magnitude2() > 0.0 {
            direction.normalize()
        } else {
            direction
        };
        let spacing = self.spacing;
        (1..=self.steps).map(move |step| origin + direction * (spacing * step as f64))
    }

    /// Carves along the ray from `origin` and invalidates the surrounding chunks.
    ///
    /// Returns the resident positions that were invalidated.
    ///
    /// # Errors
    /// Persisting the ledger may fail; the spheres stay appended in memory either way and
    /// the chunks are invalidated before the error is returned.
    pub fn fire<M: Mesher>(
        &self,
        origin: Point3<f64>,
        direction: Vector3<f64>,
        ledger: &mut CarveLedger,
        store: &mut ChunkStore<M>,
        storage: &dyn Storage,
    ) -> Result<Vec<Point3<i32>>> {
        for center in self.ray_points(origin, direction) {
            ledger.append(CarveSphere::new(center, self.radius));
        }
        info!(
            "Mined {} spheres from {origin:?}, ledger now holds {}",
            self.steps,
            ledger.len()
        );

        let center = chunk_position_of(origin, store.size());
        let invalidated: Vec<_> = store
            .positions()
            .into_iter()
            .filter(|position| chebyshev_distance(*position, center) <= self.neighborhood_radius)
            .collect();
        for position in &invalidated {
            store.invalidate(*position);
        }

        ledger.persist(storage)?;
        Ok(invalidated)
    }
}
