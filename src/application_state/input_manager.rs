//! # Input Manager
//!
//! This module tracks the raw input the terrain session consumes:
//! - The four movement keys
//! - The mining button
//! - Mouse motion for looking around
//!
//! Window events are fed in as they arrive; once per frame the manager produces a
//! `ProcessedInputState` with press/hold/release transitions and resets for the next frame.

use std::collections::HashMap;

use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use super::input_state::{ProcessedInputState, RawInputState};

const KEY_CODES: [KeyCode; 4] = [KeyCode::KeyW, KeyCode::KeyS, KeyCode::KeyA, KeyCode::KeyD];

const MOUSE_BUTTONS: [MouseButton; 1] = [MouseButton::Left];

/// Manages the state of all tracked input devices.
pub struct InputManager {
    /// Previous state of all tracked keyboard keys
    keyboard_inputs_old: HashMap<KeyCode, bool>,
    /// Current state of all tracked keyboard keys
    keyboard_inputs_new: HashMap<KeyCode, bool>,
    /// Previous state of tracked mouse buttons
    mouse_button_inputs_old: HashMap<MouseButton, bool>,
    /// Current state of tracked mouse buttons
    mouse_button_inputs_new: HashMap<MouseButton, bool>,
    /// Mouse movement accumulated since the last frame
    mouse_delta: Option<(f64, f64)>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    /// Creates a new InputManager with every tracked input released.
    pub fn new() -> Self {
        let keyboard_inputs_old: HashMap<_, _> = KEY_CODES.iter().map(|k| (*k, false)).collect();
        let mouse_button_inputs_old: HashMap<_, _> =
            MOUSE_BUTTONS.iter().map(|b| (*b, false)).collect();

        Self {
            keyboard_inputs_new: keyboard_inputs_old.clone(),
            keyboard_inputs_old,
            mouse_button_inputs_new: mouse_button_inputs_old.clone(),
            mouse_button_inputs_old,
            mouse_delta: None,
        }
    }

    /// Processes a window event, updating tracked key and button states.
    pub fn intake_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state,
                        physical_key: PhysicalKey::Code(key),
                        ..
                    },
                ..
            } => self.record_key(*key, *state == ElementState::Pressed),
            WindowEvent::MouseInput { button, state, .. } => {
                self.record_mouse_button(*button, *state == ElementState::Pressed)
            }
            WindowEvent::Focused(false) => self.release_all(),
            _ => {}
        }
    }

    /// Processes a raw device event, accumulating mouse motion.
    pub fn intake_device_event(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            self.record_mouse_motion(*delta);
        }
    }

    /// Sets the current state of a key. Untracked keys are ignored.
    pub fn record_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(key_state) = self.keyboard_inputs_new.get_mut(&key) {
            *key_state = pressed;
        }
    }

    /// Sets the current state of a mouse button. Untracked buttons are ignored.
    pub fn record_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if let Some(button_state) = self.mouse_button_inputs_new.get_mut(&button) {
            *button_state = pressed;
        }
    }

    /// Adds mouse movement to this frame's delta.
    pub fn record_mouse_motion(&mut self, (dx, dy): (f64, f64)) {
        let (x, y) = self.mouse_delta.unwrap_or((0.0, 0.0));
        self.mouse_delta = Some((x + dx, y + dy));
    }

    /// Releases every key and button, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keyboard_inputs_new.values_mut().for_each(|v| *v = false);
        self.mouse_button_inputs_new
            .values_mut()
            .for_each(|v| *v = false);
    }

    /// Creates a processed input state from the current raw boolean states.
    pub fn create_processed_input_state(&self) -> ProcessedInputState {
        let keyboard_states = self
            .keyboard_inputs_new
            .iter()
            .map(|(key, &new_state)| {
                let old_state = self.keyboard_inputs_old.get(key).copied().unwrap_or(false);
                (*key, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        let mouse_button_states = self
            .mouse_button_inputs_new
            .iter()
            .map(|(button, &new_state)| {
                let old_state = self
                    .mouse_button_inputs_old
                    .get(button)
                    .copied()
                    .unwrap_or(false);
                (*button, RawInputState::from_raw_states(old_state, new_state))
            })
            .collect();

        ProcessedInputState {
            keyboard_states,
            mouse_button_states,
            mouse_delta: self.mouse_delta,
        }
    }

    /// Returns this frame's processed input and prepares for the next frame.
    pub fn get_and_reset_processed_input(&mut self) -> ProcessedInputState {
        let processed_input = self.create_processed_input_state();
        self.keyboard_inputs_old.clone_from(&self.keyboard_inputs_new);
        self.mouse_button_inputs_old
            .clone_from(&self.mouse_button_inputs_new);
        self.mouse_delta = None;
        processed_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_press_then_hold_then_release() {
        let mut manager = InputManager::new();
        manager.record_key(KeyCode::KeyW, true);
        assert_eq!(
            manager.get_and_reset_processed_input().get_key_state(KeyCode::KeyW),
            RawInputState::Pressed
        );
        assert_eq!(
            manager.get_and_reset_processed_input().get_key_state(KeyCode::KeyW),
            RawInputState::Held
        );
        manager.record_key(KeyCode::KeyW, false);
        assert_eq!(
            manager.get_and_reset_processed_input().get_key_state(KeyCode::KeyW),
            RawInputState::Released
        );
        assert_eq!(
            manager.get_and_reset_processed_input().get_key_state(KeyCode::KeyW),
            RawInputState::NotPressed
        );
    }

    #[test]
    fn mouse_motion_accumulates_within_a_frame() {
        let mut manager = InputManager::new();
        manager.record_mouse_motion((3.0, -1.0));
        manager.record_mouse_motion((2.0, 4.0));
        assert_eq!(
            manager.get_and_reset_processed_input().get_mouse_delta(),
            Some((5.0, 3.0))
        );
        assert_eq!(manager.get_and_reset_processed_input().get_mouse_delta(), None);
    }

    #[test]
    fn untracked_keys_are_ignored() {
        let mut manager = InputManager::new();
        manager.record_key(KeyCode::KeyQ, true);
        let state = manager.get_and_reset_processed_input();
        assert!(!state.keyboard_states.contains_key(&KeyCode::KeyQ));
    }

    #[test]
    fn losing_focus_releases_everything() {
        let mut manager = InputManager::new();
        manager.record_key(KeyCode::KeyA, true);
        manager.record_mouse_button(MouseButton::Left, true);
        manager.get_and_reset_processed_input();

        manager.intake_input(&WindowEvent::Focused(false));
        let state = manager.get_and_reset_processed_input();
        assert_eq!(state.get_key_state(KeyCode::KeyA), RawInputState::Released);
        assert_eq!(
            state.get_mouse_button_state(MouseButton::Left),
            RawInputState::Released
        );
    }
}
