//! # Voxel Terrain Core
//!
//! This module contains the terrain core: the density field, the chunked cache of its
//! samples, and the operations that stream and edit it.
//!
//! ## Architecture
//!
//! * **Density**: Pure scalar field combining tunnel noise, containment and carves
//! * **Carve**: Append-only ledger of carve spheres, persisted write-through
//! * **Chunk**: Fixed-size cubic grids of negated density samples
//! * **World**: The `ChunkStore` owning every resident chunk
//! * **Streaming**: Loads and evicts chunks around the observer
//! * **Walkability**: Movement gate reading resident grids
//! * **Mining**: Appends carves along a ray and invalidates affected chunks
//!
//! ## Data Flow
//!
//! 1. Streaming asks the store to ensure the observer's neighborhood
//! 2. The store samples the density field over each new chunk and meshes the grid
//! 3. Walkability reads the cached grids to gate movement
//! 4. Mining appends carves and invalidates chunks, which streaming then rebuilds
//!
//! ## Ownership
//!
//! Everything here is owned by a single session and mutated only from its frame loop.
//! The carve ledger is passed explicitly to whoever needs it; there is no global state,
//! so independent worlds can coexist in one process.

pub mod carve;
pub mod chunk;
pub mod density;
pub mod mining;
pub mod streaming;
pub mod walkability;
pub mod world;
