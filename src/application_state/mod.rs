//! # Application State Management
//!
//! This module handles everything around the terrain engine that is not terrain:
//! - Configuration loading and validation
//! - Input handling
//! - Persistence of the observer position and carve history
//! - Frame timing for a running session
//! - The winit application lifecycle driving that session

pub mod config;
pub mod input_manager;
pub mod input_state;
pub mod persistence;

use std::sync::Arc;

use config::Config;
use input_manager::InputManager;
use log::{debug, error, info, warn};
use persistence::Storage;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    core::{Result, TerrainError},
    engine_state::{
        rendering::{meshing::Mesher, SceneStats, SurfaceSink},
        EngineState, FrameReport,
    },
};

/// Title of the session window; the position readout is appended every frame.
pub const WINDOW_TITLE: &str = "Tunnel Terrain";

/// A running terrain session: the engine plus the input and storage it is driven by.
///
/// Window and device events are fed in as they arrive; [`Session::frame`] then advances
/// the engine by the wall-clock time since the previous frame.
pub struct Session<M: Mesher> {
    /// The terrain engine
    pub engine_state: EngineState<M>,

    /// Manages input state and event processing
    pub input_manager: InputManager,

    storage: Box<dyn Storage>,

    /// Timestamp of the last frame for delta time calculations
    pub last_wait_time: web_time::Instant,
}

impl<M: Mesher> Session<M> {
    /// Starts the engine from persisted state.
    pub fn new(config: &Config, mesher: M, storage: Box<dyn Storage>) -> Result<Self> {
        let engine_state = EngineState::new(config, mesher, storage.as_ref())?;
        info!(
            "Session started with {} carve spheres and {} resident chunks",
            engine_state.ledger().len(),
            engine_state.store().len()
        );

        Ok(Self {
            engine_state,
            input_manager: InputManager::new(),
            storage,
            last_wait_time: web_time::Instant::now(),
        })
    }

    /// Forwards a window event to the input manager.
    pub fn intake_window_event(&mut self, event: &WindowEvent) {
        self.input_manager.intake_input(event);
    }

    /// Forwards a device event to the input manager.
    pub fn intake_device_event(&mut self, event: &DeviceEvent) {
        self.input_manager.intake_device_event(event);
    }

    /// Runs one frame with the time elapsed since the previous one.
    pub fn frame(&mut self, sink: &mut dyn SurfaceSink<M::Surface>) -> Result<FrameReport> {
        let now = web_time::Instant::now();
        let wait_dt = now - self.last_wait_time;
        self.last_wait_time = now;
        self.frame_with_delta(wait_dt, sink)
    }

    /// Runs one frame with an explicit time step.
    pub fn frame_with_delta(
        &mut self,
        dt: web_time::Duration,
        sink: &mut dyn SurfaceSink<M::Surface>,
    ) -> Result<FrameReport> {
        let processed_input = self.input_manager.get_and_reset_processed_input();
        let actions = EngineState::<M>::translate_processed_input(&processed_input);
        let report = self
            .engine_state
            .process_frame(&actions, dt, self.storage.as_ref(), sink)?;
        debug!("{}", report.hud_line());
        Ok(report)
    }
}

/// The application state container driven by the winit event loop.
///
/// The window is created on `resumed`. Input is forwarded to the session as it arrives,
/// and one frame runs every time the loop is about to wait. Surfaces are handed to a
/// `SceneStats` sink; the position readout is shown in the window title.
pub struct ApplicationState<M: Mesher> {
    /// The running terrain session
    pub session: Session<M>,

    /// Receives chunk surfaces as they enter and leave the scene
    pub scene: SceneStats,

    /// Handle to the application window, once created
    pub window: Option<Arc<Window>>,

    /// Whether the pointer is locked to the window; mouse look only applies while it is
    cursor_grabbed: bool,
}

impl<M: Mesher> ApplicationState<M> {
    /// Wraps a session; the window is created once the event loop resumes.
    pub fn new(session: Session<M>) -> Self {
        Self {
            session,
            scene: SceneStats::default(),
            window: None,
            cursor_grabbed: false,
        }
    }

    /// Handles a window event. Returns `true` when the application should exit.
    ///
    /// A left click while the pointer is free only locks the pointer; it does not mine.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => return true,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !self.cursor_grabbed => {
                self.grab_cursor();
                return false;
            }
            WindowEvent::Focused(false) => self.release_cursor(),
            _ => {}
        }

        self.session.intake_window_event(event);
        false
    }

    /// Handles a raw device event. Mouse motion is dropped while the pointer is free.
    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        if self.cursor_grabbed {
            self.session.intake_device_event(event);
        }
    }

    /// Runs one frame and updates the window title with the position readout.
    pub fn advance_frame(&mut self) -> Result<FrameReport> {
        let report = self.session.frame(&mut self.scene)?;
        if let Some(window) = &self.window {
            window.set_title(&format!("{WINDOW_TITLE} | {}", report.hud_line()));
        }
        Ok(report)
    }

    fn grab_cursor(&mut self) {
        let Some(window) = &self.window else {
            return;
        };
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                window.set_cursor_visible(false);
                self.cursor_grabbed = true;
            }
            Err(err) => warn!("Could not lock the pointer: {err}"),
        }
    }

    fn release_cursor(&mut self) {
        if let Some(window) = &self.window {
            if let Err(err) = window.set_cursor_grab(CursorGrabMode::None) {
                warn!("Could not release the pointer: {err}");
            }
            window.set_cursor_visible(true);
        }
        self.cursor_grabbed = false;
    }
}

impl<M: Mesher> ApplicationHandler for ApplicationState<M> {
    /// Creates the window the first time the application is resumed.
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match event_loop.create_window(Window::default_attributes().with_title(WINDOW_TITLE)) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(err) => {
                error!("Failed to create window: {err}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.handle_window_event(&event) {
            event_loop.exit();
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        self.handle_device_event(&event);
    }

    /// Runs a frame before the loop goes to sleep.
    ///
    /// A failed record write is logged and the session keeps running; any other error
    /// stops the application.
    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        match self.advance_frame() {
            Ok(_) => {}
            Err(err @ TerrainError::Storage { .. }) => error!("Failed to save: {err}"),
            Err(err) => {
                error!("Frame failed: {err}");
                event_loop.exit();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::rendering::meshing::SurfaceNetsMesher;
    use cgmath::Point3;
    use super::input_state::RawInputState;
    use super::persistence::{load_player_position, MemoryStorage};

    fn small_config() -> Config {
        let mut config = Config::default();
        config.terrain.chunk_size = 8;
        config
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = small_config();
        config.streaming.evict_radius = 1;
        assert!(Session::new(&config, SurfaceNetsMesher, Box::new(MemoryStorage::new())).is_err());
    }

    #[test]
    fn click_mines_exactly_once() {
        let mut session =
            Session::new(&small_config(), SurfaceNetsMesher, Box::new(MemoryStorage::new()))
                .unwrap();
        let mut scene = SceneStats::default();
        let dt = web_time::Duration::from_millis(16);

        session
            .input_manager
            .record_mouse_button(MouseButton::Left, true);
        assert_eq!(session.frame_with_delta(dt, &mut scene).unwrap().carved, 5);
        assert_eq!(session.frame_with_delta(dt, &mut scene).unwrap().carved, 0);
        assert_eq!(session.engine_state.ledger().len(), 5);
    }

    #[test]
    fn look_input_turns_the_observer() {
        let mut session =
            Session::new(&small_config(), SurfaceNetsMesher, Box::new(MemoryStorage::new()))
                .unwrap();
        let mut scene = SceneStats::default();
        session.input_manager.record_mouse_motion((100.0, 0.0));
        session.input_manager.record_key(KeyCode::KeyQ, true);
        session
            .frame_with_delta(web_time::Duration::from_millis(16), &mut scene)
            .unwrap();
        assert!((session.engine_state.orientation().yaw - -0.2).abs() < 1e-12);
    }

    fn application() -> ApplicationState<SurfaceNetsMesher> {
        ApplicationState::new(
            Session::new(&small_config(), SurfaceNetsMesher, Box::new(MemoryStorage::new()))
                .unwrap(),
        )
    }

    #[test]
    fn close_request_exits() {
        let mut app = application();
        assert!(app.handle_window_event(&WindowEvent::CloseRequested));
        assert!(!app.handle_window_event(&WindowEvent::Focused(true)));
    }

    #[test]
    fn mouse_look_requires_locked_pointer() {
        let mut app = application();
        let motion = DeviceEvent::MouseMotion { delta: (100.0, 0.0) };

        app.handle_device_event(&motion);
        app.advance_frame().unwrap();
        assert_eq!(app.session.engine_state.orientation().yaw, 0.0);

        app.cursor_grabbed = true;
        app.handle_device_event(&motion);
        app.advance_frame().unwrap();
        assert!((app.session.engine_state.orientation().yaw - -0.2).abs() < 1e-12);
    }

    #[test]
    fn focus_loss_releases_pointer_and_keys() {
        let mut app = application();
        app.cursor_grabbed = true;
        app.session.input_manager.record_key(KeyCode::KeyW, true);
        app.session.input_manager.get_and_reset_processed_input();

        assert!(!app.handle_window_event(&WindowEvent::Focused(false)));
        assert!(!app.cursor_grabbed);
        let input = app.session.input_manager.get_and_reset_processed_input();
        assert_eq!(input.get_key_state(KeyCode::KeyW), RawInputState::Released);
    }

    #[test]
    fn scripted_walkthrough_mines_and_saves() {
        let mut session =
            Session::new(&small_config(), SurfaceNetsMesher, Box::new(MemoryStorage::new()))
                .unwrap();
        let mut scene = SceneStats::default();
        let dt = web_time::Duration::from_millis(16);

        session.input_manager.record_mouse_motion((40.0, -15.0));
        session.frame_with_delta(dt, &mut scene).unwrap();

        session
            .input_manager
            .record_mouse_button(MouseButton::Left, true);
        assert_eq!(session.frame_with_delta(dt, &mut scene).unwrap().carved, 5);
        session
            .input_manager
            .record_mouse_button(MouseButton::Left, false);

        session.input_manager.record_key(KeyCode::KeyW, true);
        let mut last = None;
        for _ in 0..30 {
            let report = session.frame_with_delta(dt, &mut scene).unwrap();
            assert!(session.engine_state.store().len() >= 27);
            last = Some(report);
        }

        let report = last.unwrap();
        assert_eq!(session.engine_state.ledger().len(), 5);
        assert_eq!(scene.attached, session.engine_state.store().len());
        let saved: Point3<f64> = load_player_position(session.storage.as_ref()).unwrap();
        assert_eq!(saved, report.position);
    }
}
