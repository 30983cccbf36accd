//! # World Module
//!
//! This module provides the `ChunkStore`, which owns every resident chunk of the world.
//!
//! ## Architecture
//!
//! The world is sparse: only chunks the streaming controller asked for are kept, keyed
//! by their chunk coordinates in a hash map. Chunks never reference their neighbors, so
//! the map is the only structure tying them together.
//!
//! ## Lifecycle
//!
//! - `ensure` samples the density field into a fresh grid and hands it to the mesher
//! - `evict` releases the grid and moves the surface out to the renderer
//! - `invalidate` evicts and remembers the position so the next streaming pass rebuilds it
//!
//! Every attach and release is queued as a [`SurfaceEvent`] and drained by the frame's
//! surface sync stage.

use std::collections::{HashMap, HashSet};

use cgmath::Point3;
use log::debug;

use crate::{
    core::Result,
    engine_state::rendering::{meshing::Mesher, SurfaceEvent, SurfaceSink},
};

use super::{
    carve::CarveSphere,
    chunk::{chunk_creation::sample_grid, Chunk},
    density::DensityField,
};

/// Resident chunks keyed by chunk coordinates.
pub struct ChunkStore<M: Mesher> {
    chunks: HashMap<Point3<i32>, Chunk<M::Surface>>,
    mesher: M,
    size: usize,
    isolevel: f32,
    pending_regeneration: HashSet<Point3<i32>>,
    surface_events: Vec<SurfaceEvent<M::Surface>>,
}

impl<M: Mesher> ChunkStore<M> {
    /// Creates an empty store producing `size³` grids.
    pub fn new(mesher: M, size: usize, isolevel: f32) -> Self {
        Self {
            chunks: HashMap::new(),
            mesher,
            size,
            isolevel,
            pending_regeneration: HashSet::new(),
            surface_events: Vec::new(),
        }
    }

    /// Edge length of every chunk grid.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Density threshold handed to the mesher.
    pub fn isolevel(&self) -> f32 {
        self.isolevel
    }

    /// Makes the chunk at `position` resident, generating it if needed.
    ///
    /// Does nothing when the chunk is already resident. Otherwise every cell is sampled
    /// from `field` with the current carves, the negated values are stored, and the grid
    /// is meshed.
    ///
    /// # Errors
    /// Allocation and mesher failures are returned; the chunk then stays absent.
    pub fn ensure(
        &mut self,
        position: Point3<i32>,
        field: &DensityField,
        carves: &[CarveSphere],
    ) -> Result<()> {
        if self.chunks.contains_key(&position) {
            return Ok(());
        }

        let grid = sample_grid(position, self.size, field, carves)?;
        let surface = self
            .mesher
            .extract(position, &grid, self.size, self.isolevel)?;
        debug!("Generated chunk {position:?}");

        self.chunks.insert(
            position,
            Chunk {
                position,
                size: self.size,
                grid,
                surface,
            },
        );
        self.pending_regeneration.remove(&position);
        self.surface_events.push(SurfaceEvent::Attached(position));
        Ok(())
    }

    /// Removes the chunk at `position` if present and releases its surface.
    pub fn evict(&mut self, position: Point3<i32>) {
        let Some(chunk) = self.chunks.remove(&position) else {
            return;
        };
        debug!("Evicted chunk {position:?}");

        // A surface the renderer never saw is dropped here instead of being detached.
        let unseen = self
            .surface_events
            .iter()
            .position(|event| matches!(event, SurfaceEvent::Attached(p) if *p == position));
        match unseen {
            Some(index) => {
                self.surface_events.remove(index);
            }
            None => self
                .surface_events
                .push(SurfaceEvent::Detached(position, chunk.surface)),
        }
    }

    /// Looks up a resident chunk.
    pub fn get(&self, position: Point3<i32>) -> Option<&Chunk<M::Surface>> {
        self.chunks.get(&position)
    }

    /// Whether the chunk at `position` is resident.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.chunks.contains_key(&position)
    }

    /// Evicts the chunk and marks it for regeneration on the next streaming pass.
    ///
    /// Only resident chunks are marked; an absent chunk has nothing stale to rebuild.
    pub fn invalidate(&mut self, position: Point3<i32>) {
        if self.chunks.contains_key(&position) {
            self.evict(position);
            self.pending_regeneration.insert(position);
        }
    }

    /// Takes the set of positions awaiting regeneration.
    pub fn take_pending_regeneration(&mut self) -> HashSet<Point3<i32>> {
        std::mem::take(&mut self.pending_regeneration)
    }

    /// Positions awaiting regeneration.
    pub fn pending_regeneration(&self) -> &HashSet<Point3<i32>> {
        &self.pending_regeneration
    }

    /// Positions of every resident chunk, in no particular order.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        self.chunks.keys().copied().collect()
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Delivers queued surface changes to the renderer, in the order they happened.
    pub fn sync_surfaces(&mut self, sink: &mut dyn SurfaceSink<M::Surface>) {
        for event in self.surface_events.drain(..) {
            match event {
                SurfaceEvent::Attached(position) => {
                    if let Some(chunk) = self.chunks.get(&position) {
                        sink.attach(position, &chunk.surface);
                    }
                }
                SurfaceEvent::Detached(position, surface) => sink.detach(position, surface),
            }
        }
    }
}
