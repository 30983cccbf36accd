//! Renderer-facing side of the terrain core.
//!
//! The core never talks to a graphics API. The chunk store records which surfaces became
//! resident or were released, and the frame's mesh/resource sync stage drains those events
//! into a [`SurfaceSink`] owned by the renderer.

use cgmath::Point3;
use log::debug;

pub mod meshing;

/// A change to the set of chunk surfaces the renderer should display.
#[derive(Debug)]
pub enum SurfaceEvent<S> {
    /// The chunk at this position now has a surface; read it through the chunk store.
    Attached(Point3<i32>),
    /// The chunk was evicted or invalidated; ownership of its surface moves to the renderer
    /// so it can release any resources built from it.
    Detached(Point3<i32>, S),
}

/// Receives chunk surfaces as they enter and leave the scene.
pub trait SurfaceSink<S> {
    /// Adds (or replaces) the surface of a chunk.
    fn attach(&mut self, position: Point3<i32>, surface: &S);

    /// Removes the surface of a chunk and releases it.
    fn detach(&mut self, position: Point3<i32>, surface: S);
}

/// A sink that only keeps scene statistics, used by headless sessions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SceneStats {
    /// Surfaces currently in the scene
    pub attached: usize,
    /// Surfaces attached since creation
    pub total_attached: usize,
    /// Surfaces released since creation
    pub total_detached: usize,
}

impl<S> SurfaceSink<S> for SceneStats {
    fn attach(&mut self, position: Point3<i32>, _surface: &S) {
        debug!("Surface attached at {position:?}");
        self.attached += 1;
        self.total_attached += 1;
    }

    fn detach(&mut self, position: Point3<i32>, surface: S) {
        debug!("Surface released at {position:?}");
        self.attached = self.attached.saturating_sub(1);
        self.total_detached += 1;
        drop(surface);
    }
}
