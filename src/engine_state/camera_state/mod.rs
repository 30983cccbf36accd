//! # Camera State Management
//!
//! This module handles the observer driving the terrain core:
//! - Position and orientation tracking
//! - Spawn selection from persisted state or configuration
//! - Input processing for look and movement
//! - Walkability gating of movement
//!
//! ## Core Components
//! - `ObserverState`: The observer's world position and orientation
//! - `CameraController`: Applies player actions to an observer

use camera::Orientation;
use cgmath::{InnerSpace, Point3, Vector3};
use web_time::Duration;

use crate::application_state::config::PlayerConfig;

use super::{
    rendering::meshing::Mesher,
    voxels::{walkability::is_walkable, world::ChunkStore},
    PlayerAction,
};

pub mod camera;

/// World position and orientation of the observer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObserverState {
    /// Position in world space
    pub position: Point3<f64>,
    /// Look orientation
    pub orientation: Orientation,
}

impl ObserverState {
    /// Picks the starting observer.
    ///
    /// A persisted position is resumed with the default orientation. Without one the
    /// observer spawns at the configured point, facing the configured target.
    pub fn spawn(saved_position: Option<Point3<f64>>, config: &PlayerConfig) -> Self {
        match saved_position {
            Some(position) => Self {
                position,
                orientation: Orientation::default(),
            },
            None => {
                let position = Point3::from(config.spawn_position);
                Self {
                    position,
                    orientation: Orientation::looking_at(
                        position,
                        Point3::from(config.spawn_look_at),
                    ),
                }
            }
        }
    }
}

/// Applies player actions to an observer.
#[derive(Debug, Clone)]
pub struct CameraController {
    speed: f64,
    sensitivity: f64,
}

impl CameraController {
    /// Creates a controller with the configured speed and look sensitivity.
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            speed: config.move_speed,
            sensitivity: config.look_sensitivity,
        }
    }

    /// Applies the mouse look delta of `actions`, if any.
    pub fn update_orientation(&self, observer: &mut ObserverState, actions: &PlayerAction) {
        if let Some((dx, dy)) = actions.rotate_view {
            observer
                .orientation
                .apply_mouse_delta(dx, dy, self.sensitivity);
        }
    }

    /// Position the observer would move to this frame, ignoring walkability.
    ///
    /// Returns `None` when no movement is requested or opposing keys cancel out.
    pub fn candidate_position(
        &self,
        observer: &ObserverState,
        actions: &PlayerAction,
        dt: Duration,
    ) -> Option<Point3<f64>> {
        let axis = |positive: bool, negative: bool| (positive as i8 - negative as i8) as f64;
        let local = Vector3::new(
            axis(actions.move_right, actions.move_left),
            0.0,
            axis(actions.move_backward, actions.move_forward),
        );
        if local.magnitude2() == 0.0 {
            return None;
        }

        let step = observer.orientation.to_world(local.normalize()) * (self.speed * dt.as_secs_f64());
        Some(observer.position + step)
    }

    /// Moves the observer if the target point is walkable. Returns whether it moved.
    pub fn apply_movement<M: Mesher>(
        &self,
        observer: &mut ObserverState,
        actions: &PlayerAction,
        dt: Duration,
        store: &ChunkStore<M>,
    ) -> bool {
        match self.candidate_position(observer, actions, dt) {
            Some(target) if is_walkable(store, target) => {
                observer.position = target;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application_state::config::TerrainConfig,
        core::Result,
        engine_state::voxels::{chunk::chunk_position_of, density::DensityField},
    };

    struct NullMesher;

    impl Mesher for NullMesher {
        type Surface = ();

        fn extract(&self, _: Point3<i32>, _: &[f32], _: usize, _: f32) -> Result<()> {
            Ok(())
        }
    }

    fn forward() -> PlayerAction {
        PlayerAction {
            move_forward: true,
            ..PlayerAction::default()
        }
    }

    #[test]
    fn fresh_spawn_faces_world_center() {
        let observer = ObserverState::spawn(None, &PlayerConfig::default());
        assert_eq!(observer.position, Point3::new(32.0, 32.0, 64.0));
        assert!((observer.orientation.forward() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-9);
    }

    #[test]
    fn saved_position_resumes_with_default_orientation() {
        let saved = Point3::new(1.0, 2.0, 3.0);
        let observer = ObserverState::spawn(Some(saved), &PlayerConfig::default());
        assert_eq!(observer.position, saved);
        assert_eq!(observer.orientation, Orientation::default());
    }

    #[test]
    fn forward_moves_along_view_at_configured_speed() {
        let controller = CameraController::new(&PlayerConfig::default());
        let observer = ObserverState {
            position: Point3::new(0.0, 0.0, 0.0),
            orientation: Orientation::default(),
        };
        let target = controller
            .candidate_position(&observer, &forward(), Duration::from_millis(100))
            .unwrap();
        assert!((target - Point3::new(0.0, 0.0, -3.0)).magnitude() < 1e-9);
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let controller = CameraController::new(&PlayerConfig::default());
        let observer = ObserverState::spawn(Some(Point3::new(0.0, 0.0, 0.0)), &PlayerConfig::default());
        let actions = PlayerAction {
            move_forward: true,
            move_right: true,
            ..PlayerAction::default()
        };
        let target = controller
            .candidate_position(&observer, &actions, Duration::from_secs(1))
            .unwrap();
        assert!(((target - observer.position).magnitude() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn opposing_keys_cancel() {
        let controller = CameraController::new(&PlayerConfig::default());
        let observer = ObserverState::spawn(None, &PlayerConfig::default());
        let actions = PlayerAction {
            move_forward: true,
            move_backward: true,
            ..PlayerAction::default()
        };
        assert_eq!(
            controller.candidate_position(&observer, &actions, Duration::from_secs(1)),
            None
        );
    }

    #[test]
    fn movement_is_blocked_outside_resident_chunks() {
        let controller = CameraController::new(&PlayerConfig::default());
        let store = ChunkStore::new(NullMesher, 8, 0.0);
        let mut observer = ObserverState::spawn(None, &PlayerConfig::default());
        let before = observer.position;
        assert!(!controller.apply_movement(&mut observer, &forward(), Duration::from_millis(16), &store));
        assert_eq!(observer.position, before);
    }

    #[test]
    fn movement_succeeds_into_walkable_cell() {
        // Far outside the containment shell every stored value is below the isolevel.
        let field = DensityField::new(&TerrainConfig::default());
        let controller = CameraController::new(&PlayerConfig::default());
        let mut store = ChunkStore::new(NullMesher, 8, 0.0);
        let start = Point3::new(-316.0, -316.0, -316.0);
        store
            .ensure(chunk_position_of(start, 8), &field, &[])
            .unwrap();

        let mut observer = ObserverState::spawn(Some(start), &PlayerConfig::default());
        assert!(controller.apply_movement(&mut observer, &forward(), Duration::from_millis(50), &store));
        assert!((observer.position.z - (-317.5)).abs() < 1e-9);
    }

    #[test]
    fn look_delta_rotates_observer() {
        let controller = CameraController::new(&PlayerConfig::default());
        let mut observer = ObserverState::spawn(None, &PlayerConfig::default());
        let actions = PlayerAction {
            rotate_view: Some((100.0, -50.0)),
            ..PlayerAction::default()
        };
        controller.update_orientation(&mut observer, &actions);
        assert!((observer.orientation.yaw - -0.2).abs() < 1e-12);
        assert!((observer.orientation.pitch - 0.1).abs() < 1e-12);
    }
}
