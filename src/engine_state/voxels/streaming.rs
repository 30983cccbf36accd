//! # Streaming Controller
//!
//! Keeps the resident chunk set centered on the observer.
//!
//! Each tick ensures every chunk within Chebyshev distance `load_radius` of the
//! observer's chunk, then evicts resident chunks whose Manhattan distance exceeds
//! `evict_radius`. Ensuring first means a required chunk is never momentarily absent, and
//! the gap between the two radii keeps chunks from thrashing at boundaries.

use cgmath::Point3;
use log::debug;

use crate::{application_state::config::StreamingConfig, core::Result};

use super::{
    carve::CarveSphere,
    chunk::{chunk_position_of, manhattan_distance, neighborhood},
    density::DensityField,
    world::ChunkStore,
};
use crate::engine_state::rendering::meshing::Mesher;

/// Drives chunk residency from the observer position.
#[derive(Debug, Clone)]
pub struct StreamingController {
    load_radius: i32,
    evict_radius: i32,
}

/// What a streaming tick changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingReport {
    /// Chunk the observer stands in
    pub center: Point3<i32>,
    /// Chunks generated this tick, including regenerated ones
    pub generated: usize,
    /// Chunks evicted this tick
    pub evicted: usize,
}

impl StreamingController {
    /// Creates a controller with the configured radii.
    pub fn new(config: &StreamingConfig) -> Self {
        Self {
            load_radius: config.load_radius,
            evict_radius: config.evict_radius,
        }
    }

    /// Chebyshev radius of the required neighborhood.
    pub fn load_radius(&self) -> i32 {
        self.load_radius
    }

    /// Manhattan radius beyond which chunks are evicted.
    pub fn evict_radius(&self) -> i32 {
        self.evict_radius
    }

    /// Chunk positions that must be resident for an observer in chunk `center`.
    pub fn required(&self, center: Point3<i32>) -> impl Iterator<Item = Point3<i32>> {
        neighborhood(center, self.load_radius)
    }

    /// Brings the store in line with an observer at `observer`.
    ///
    /// Chunks invalidated since the last tick are rebuilt if they are still within the
    /// eviction radius, so a mined chunk comes back even at the edge of the hysteresis band.
    pub fn tick<M: Mesher>(
        &self,
        observer: Point3<f64>,
        store: &mut ChunkStore<M>,
        field: &DensityField,
        carves: &[CarveSphere],
    ) -> Result<StreamingReport> {
        let center = chunk_position_of(observer, store.size());
        let mut report = StreamingReport {
            center,
            generated: 0,
            evicted: 0,
        };

        for position in self.required(center) {
            if !store.contains(position) {
                store.ensure(position, field, carves)?;
                report.generated += 1;
            }
        }

        for position in store.take_pending_regeneration() {
            if manhattan_distance(position, center) <= self.evict_radius
                && !store.contains(position)
            {
                store.ensure(position, field, carves)?;
                report.generated += 1;
            }
        }

        for position in store.positions() {
            if manhattan_distance(position, center) > self.evict_radius {
                store.evict(position);
                report.evicted += 1;
            }
        }

        if report.generated > 0 || report.evicted > 0 {
            debug!(
                "Streaming around {center:?}: {} generated, {} evicted, {} resident",
                report.generated,
                report.evicted,
                store.len()
            );
        }

        Ok(report)
    }
}
