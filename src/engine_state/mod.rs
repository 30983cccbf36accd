//! # Engine State Module
//!
//! The engine module that owns the terrain core and advances it one frame at a time.
//!
//! ## Key Components
//!
//! * `EngineState` - Owns the density field, carve ledger, chunk store and observer
//! * `camera_state` - Observer position, orientation and movement
//! * `rendering` - Mesher and renderer seams
//! * `voxels` - Density field, chunks, streaming, walkability and mining
//!
//! ## Frame Pipeline
//!
//! Every frame runs the same stages, each to completion before the next starts:
//!
//! 1. Orientation update from the mouse delta
//! 2. Movement, gated by walkability
//! 3. Mining, when requested
//! 4. Streaming around the new position
//! 5. Surface sync to the renderer
//! 6. Player position persistence
//!
//! Nothing runs concurrently with the frame, so none of the state needs locking.

use camera_state::{camera::Orientation, CameraController, ObserverState};
use cgmath::Point3;
use log::{error, info, warn};
use rendering::{meshing::Mesher, SurfaceSink};
use voxels::{
    carve::CarveLedger, chunk::chunk_position_in_range, density::DensityField,
    mining::MiningOperation, streaming::StreamingController, walkability::is_walkable,
    world::ChunkStore,
};
use web_time::Duration;
use winit::{event::MouseButton, keyboard::KeyCode};

use crate::{
    application_state::{
        config::Config,
        input_state::ProcessedInputState,
        persistence::{load_player_position, store_player_position, Storage},
    },
    core::Result,
};

pub mod camera_state;
pub mod rendering;
pub mod voxels;

/// The state container for one terrain world.
pub struct EngineState<M: Mesher> {
    /// The observer the world streams around
    pub observer: ObserverState,
    camera_controller: CameraController,
    field: DensityField,
    ledger: CarveLedger,
    store: ChunkStore<M>,
    streaming: StreamingController,
    mining: MiningOperation,
}

/// Summary of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    /// Observer position after movement
    pub position: Point3<f64>,
    /// Whether the requested movement was accepted
    pub moved: bool,
    /// Number of carve spheres added this frame
    pub carved: usize,
    /// Chunks generated this frame
    pub generated: usize,
    /// Chunks evicted this frame
    pub evicted: usize,
    /// Resident chunks after streaming
    pub resident: usize,
}

impl FrameReport {
    /// Single-line position readout.
    pub fn hud_line(&self) -> String {
        format!(
            "X: {:.1}  Y: {:.1}  Z (Depth): {:.1}",
            self.position.x, self.position.y, self.position.z
        )
    }
}

impl<M: Mesher> EngineState<M> {
    /// Restores persisted state and streams in the initial neighborhood.
    ///
    /// Corrupt or missing persisted records fall back to an empty carve ledger and the
    /// configured spawn.
    ///
    /// # Errors
    /// Fails on an invalid configuration or if the initial chunks cannot be generated.
    pub fn new(config: &Config, mesher: M, storage: &dyn Storage) -> Result<Self> {
        config.validate()?;

        let mut ledger = CarveLedger::new();
        ledger.load(storage);

        let margin = config.streaming.load_radius + config.streaming.evict_radius;
        let saved = load_player_position(storage).filter(|position| {
            let in_range =
                chunk_position_in_range(*position, config.terrain.chunk_size, margin).is_some();
            if !in_range {
                warn!("Saved position {position:?} is outside the streamable world, using spawn");
            }
            in_range
        });
        let observer = ObserverState::spawn(saved, &config.player);
        info!("Observer starts at {:?}", observer.position);

        let mut engine = Self {
            observer,
            camera_controller: CameraController::new(&config.player),
            field: DensityField::new(&config.terrain),
            ledger,
            store: ChunkStore::new(mesher, config.terrain.chunk_size, config.terrain.isolevel),
            streaming: StreamingController::new(&config.streaming),
            mining: MiningOperation::new(
                &config.carve,
                config.streaming.load_radius,
                config.terrain.chunk_size,
            ),
        };
        engine.stream()?;
        Ok(engine)
    }

    /// Runs one frame of the pipeline.
    ///
    /// A failed ledger write does not abort the frame: streaming, surface sync and
    /// position persistence still run so the world stays consistent, and the error is
    /// returned afterwards.
    pub fn process_frame(
        &mut self,
        actions: &PlayerAction,
        dt: Duration,
        storage: &dyn Storage,
        sink: &mut dyn SurfaceSink<M::Surface>,
    ) -> Result<FrameReport> {
        self.camera_controller
            .update_orientation(&mut self.observer, actions);

        let moved =
            self.camera_controller
                .apply_movement(&mut self.observer, actions, dt, &self.store);

        let (carved, mining_result) = if actions.mine {
            let before = self.ledger.len();
            let result = self.mine(storage);
            (self.ledger.len() - before, result)
        } else {
            (0, Ok(()))
        };

        let streaming = self.stream()?;

        self.store.sync_surfaces(sink);

        if let Err(err) = store_player_position(storage, self.observer.position) {
            error!("Failed to persist player position: {err}");
        }

        mining_result?;

        Ok(FrameReport {
            position: self.observer.position,
            moved,
            carved,
            generated: streaming.generated,
            evicted: streaming.evicted,
            resident: self.store.len(),
        })
    }

    /// Fires a carve ray from the observer along its view direction.
    pub fn mine(&mut self, storage: &dyn Storage) -> Result<()> {
        self.mining
            .fire(
                self.observer.position,
                self.observer.orientation.forward(),
                &mut self.ledger,
                &mut self.store,
                storage,
            )
            .map(|_| ())
    }

    fn stream(&mut self) -> Result<voxels::streaming::StreamingReport> {
        self.streaming.tick(
            self.observer.position,
            &mut self.store,
            &self.field,
            self.ledger.all(),
        )
    }

    /// Delivers pending surface changes without running a frame.
    pub fn sync_surfaces(&mut self, sink: &mut dyn SurfaceSink<M::Surface>) {
        self.store.sync_surfaces(sink);
    }

    /// Whether the observer could stand at `point`.
    pub fn is_walkable(&self, point: Point3<f64>) -> bool {
        is_walkable(&self.store, point)
    }

    /// Current observer orientation.
    pub fn orientation(&self) -> Orientation {
        self.observer.orientation
    }

    /// The carve history.
    pub fn ledger(&self) -> &CarveLedger {
        &self.ledger
    }

    /// The resident chunks.
    pub fn store(&self) -> &ChunkStore<M> {
        &self.store
    }

    /// The density field chunks are sampled from.
    pub fn field(&self) -> &DensityField {
        &self.field
    }

    /// Translates the processed input state into player actions.
    pub fn translate_processed_input(input: &ProcessedInputState) -> PlayerAction {
        PlayerAction {
            move_forward: input.get_key_state(KeyCode::KeyW).is_active(),
            move_backward: input.get_key_state(KeyCode::KeyS).is_active(),
            move_left: input.get_key_state(KeyCode::KeyA).is_active(),
            move_right: input.get_key_state(KeyCode::KeyD).is_active(),
            rotate_view: input.get_mouse_delta(),
            // Mining fires once per click, not while held
            mine: input
                .get_mouse_button_state(MouseButton::Left)
                .is_just_pressed(),
        }
    }
}

/// Represents player actions derived from input
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PlayerAction {
    /// Move along the view direction
    pub move_forward: bool,
    /// Move against the view direction
    pub move_backward: bool,
    /// Strafe left
    pub move_left: bool,
    /// Strafe right
    pub move_right: bool,
    /// Mouse movement in pixels, if any
    pub rotate_view: Option<(f64, f64)>,
    /// Fire a carve ray
    pub mine: bool,
}
