//! Keyboard state for the host window.
//!
//! Without a webcam the host drives the simulated detector from the
//! keyboard: [`Input`] tracks key state from winit events and
//! [`PoseControls`] turns it into a [`HandPose`].
//!
//! | Key | Pose |
//! |---|---|
//! | `1` | open hand |
//! | `2` | fist |
//! | `0` | no hand |
//! | `↑` / `↓` | nudge finger extension by 0.1 |

use crate::sim::HandPose;
use std::collections::HashSet;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Keys the host reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Key0,
    Key1,
    Key2,
    Up,
    Down,
    Escape,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Digit0 | WinitKeyCode::Numpad0 => KeyCode::Key0,
            WinitKeyCode::Digit1 | WinitKeyCode::Numpad1 => KeyCode::Key1,
            WinitKeyCode::Digit2 | WinitKeyCode::Numpad2 => KeyCode::Key2,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Held keys plus the keys that went down or up this frame.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Went down this frame. Auto-repeat does not count.
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    /// Clear per-frame state. Call after the frame has consumed it.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(code) = event.physical_key {
                match event.state {
                    ElementState::Pressed => self.key_down(KeyCode::from(code)),
                    ElementState::Released => self.key_up(KeyCode::from(code)),
                }
            }
        }
    }

    fn key_down(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    fn key_up(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
        self.keys_released.insert(key);
    }
}

/// Step applied by the arrow keys to the finger extension.
pub const EXTENSION_STEP: f32 = 0.1;

/// Keyboard mapping onto simulated hand poses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseControls {
    pose: HandPose,
}

impl PoseControls {
    pub fn new(pose: HandPose) -> Self {
        Self { pose }
    }

    pub fn pose(&self) -> HandPose {
        self.pose
    }

    /// Apply this frame's key presses; returns the new pose if it changed.
    pub fn apply(&mut self, input: &Input) -> Option<HandPose> {
        let mut next = self.pose;
        if input.key_pressed(KeyCode::Key1) {
            next = HandPose::Open;
        }
        if input.key_pressed(KeyCode::Key2) {
            next = HandPose::Fist;
        }
        if input.key_pressed(KeyCode::Key0) {
            next = HandPose::Absent;
        }
        let nudge = match (input.key_pressed(KeyCode::Up), input.key_pressed(KeyCode::Down)) {
            (true, false) => EXTENSION_STEP,
            (false, true) => -EXTENSION_STEP,
            _ => 0.0,
        };
        if nudge != 0.0 {
            // An absent hand reappears as a fist before being nudged.
            let base = next.extension().unwrap_or(1.1);
            next = HandPose::Custom((base + nudge).max(0.0));
        }

        if next == self.pose {
            return None;
        }
        self.pose = next;
        Some(next)
    }
}

impl Default for PoseControls {
    fn default() -> Self {
        Self::new(HandPose::Absent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_state() {
        let mut input = Input::new();
        assert!(!input.key_held(KeyCode::Key1));

        input.key_down(KeyCode::Key1);
        assert!(input.key_held(KeyCode::Key1));
        assert!(input.key_pressed(KeyCode::Key1));

        input.begin_frame();
        assert!(input.key_held(KeyCode::Key1));
        assert!(!input.key_pressed(KeyCode::Key1));

        // Auto-repeat while held is not a new press.
        input.key_down(KeyCode::Key1);
        assert!(!input.key_pressed(KeyCode::Key1));

        input.key_up(KeyCode::Key1);
        assert!(!input.key_held(KeyCode::Key1));
        assert!(input.key_released(KeyCode::Key1));
    }

    #[test]
    fn test_digit_keys_select_pose() {
        let mut input = Input::new();
        let mut controls = PoseControls::default();

        input.key_down(KeyCode::Key1);
        assert_eq!(controls.apply(&input), Some(HandPose::Open));
        input.begin_frame();
        assert_eq!(controls.apply(&input), None);

        input.key_up(KeyCode::Key1);
        input.key_down(KeyCode::Key0);
        assert_eq!(controls.apply(&input), Some(HandPose::Absent));
    }

    #[test]
    fn test_arrows_nudge_extension() {
        let mut input = Input::new();
        let mut controls = PoseControls::new(HandPose::Fist);

        input.key_down(KeyCode::Up);
        match controls.apply(&input) {
            Some(HandPose::Custom(ratio)) => assert!((ratio - 1.2).abs() < 1e-6),
            other => panic!("unexpected pose {other:?}"),
        }
    }

    #[test]
    fn test_winit_mapping() {
        assert_eq!(KeyCode::from(WinitKeyCode::Digit2), KeyCode::Key2);
        assert_eq!(KeyCode::from(WinitKeyCode::ArrowDown), KeyCode::Down);
        assert!(matches!(KeyCode::from(WinitKeyCode::KeyQ), KeyCode::Other(_)));
    }
}
