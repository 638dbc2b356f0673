/// Platform-agnostic input handling system
use std::collections::HashSet;

use glam::{Vec2, Vec3};

use crate::model::{CameraPose, CameraSettings};

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events, window pixel coordinates
    CursorMoved { x: f32, y: f32 },
    MouseButton { button: MouseButton, pressed: bool, x: f32, y: f32 },

    // Window events
    FocusLost,
    VisibilityChanged { visible: bool },
}

impl InputEvent {
    /// Presses that an overlay UI may claim. Releases, cursor motion and
    /// window events always reach the camera so no state gets stuck.
    pub fn is_press(&self) -> bool {
        matches!(
            self,
            InputEvent::KeyDown(_) | InputEvent::MouseButton { pressed: true, .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl MouseButton {
    pub fn from_web_button(button: i16) -> Self {
        match button {
            0 => MouseButton::Left,
            1 => MouseButton::Middle,
            2 => MouseButton::Right,
            _ => MouseButton::Left,
        }
    }
}

/// The six camera translation directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAction {
    Forward,
    Back,
    StrafeLeft,
    StrafeRight,
    Up,
    Down,
}

impl MoveAction {
    pub const ALL: [MoveAction; 6] = [
        MoveAction::Forward,
        MoveAction::Back,
        MoveAction::StrafeLeft,
        MoveAction::StrafeRight,
        MoveAction::Up,
        MoveAction::Down,
    ];

    /// Unit direction of this action for the given pose.
    pub fn direction(self, pose: &CameraPose) -> Vec3 {
        match self {
            MoveAction::Forward => pose.front(),
            MoveAction::Back => -pose.front(),
            MoveAction::StrafeRight => pose.right(),
            MoveAction::StrafeLeft => -pose.right(),
            MoveAction::Up => pose.up(),
            MoveAction::Down => -pose.up(),
        }
    }
}

/// Raw key and cursor state, persisted across frames
#[derive(Debug, Default)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pub cursor: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state. Mouse buttons are left to
    /// the camera controller.
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                self.pressed_keys.insert(normalize_key(key));
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(&normalize_key(key));
            }
            InputEvent::CursorMoved { x, y } | InputEvent::MouseButton { x, y, .. } => {
                self.cursor = Vec2::new(*x, *y);
            }
            InputEvent::FocusLost | InputEvent::VisibilityChanged { .. } => {
                self.clear_keys();
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(&normalize_key(key))
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }
}

fn normalize_key(key: &str) -> String {
    key.to_ascii_lowercase()
}

/// Key mapping configuration
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub free_look: MouseButton,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            up: "e".to_string(),
            down: "q".to_string(),
            free_look: MouseButton::Right,
        }
    }
}

/// High-level input processor
#[derive(Debug, Clone, Default)]
pub struct InputProcessor {
    bindings: KeyBindings,
}

impl InputProcessor {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    pub fn is_down(&self, input: &InputState, action: MoveAction) -> bool {
        let key = match action {
            MoveAction::Forward => &self.bindings.forward,
            MoveAction::Back => &self.bindings.backward,
            MoveAction::StrafeLeft => &self.bindings.left,
            MoveAction::StrafeRight => &self.bindings.right,
            MoveAction::Up => &self.bindings.up,
            MoveAction::Down => &self.bindings.down,
        };
        input.is_key_pressed(key)
    }

    pub fn is_free_look_button(&self, button: MouseButton) -> bool {
        button == self.bindings.free_look
    }
}

/// Camera motion derived from one frame of input.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionDeltas {
    pub translation: Vec3,
    /// `(yaw, pitch)` in degrees
    pub rotation: Vec2,
}

/// Turns held keys and cursor travel into camera deltas.
#[derive(Debug, Clone, Copy)]
pub struct InputSampler {
    move_speed: f32,
    rotation_speed: f32,
}

impl InputSampler {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            move_speed: settings.move_speed,
            rotation_speed: settings.rotation_speed,
        }
    }

    /// `move_speed * direction` summed over every held movement key.
    pub fn translation(&self, processor: &InputProcessor, input: &InputState, pose: &CameraPose) -> Vec3 {
        MoveAction::ALL
            .iter()
            .filter(|action| processor.is_down(input, **action))
            .map(|action| self.move_speed * action.direction(pose))
            .sum()
    }

    /// Cursor travel since `previous`, inverted: moving right turns left and
    /// moving down pitches down.
    pub fn rotation(&self, cursor: Vec2, previous: Vec2) -> Vec2 {
        -(cursor - previous) * self.rotation_speed
    }

    pub fn sample(
        &self,
        processor: &InputProcessor,
        input: &InputState,
        pose: &CameraPose,
        previous_cursor: Vec2,
    ) -> MotionDeltas {
        MotionDeltas {
            translation: self.translation(processor, input, pose),
            rotation: self.rotation(input.cursor, previous_cursor),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub mod wasm {
    use super::*;
    use web_sys::{KeyboardEvent, MouseEvent};

    pub fn keyboard_event_to_input(e: &KeyboardEvent, is_down: bool) -> InputEvent {
        let key = e.key();
        if is_down {
            InputEvent::KeyDown(key)
        } else {
            InputEvent::KeyUp(key)
        }
    }

    pub fn mouse_move_to_input(e: &MouseEvent) -> InputEvent {
        InputEvent::CursorMoved {
            x: e.offset_x() as f32,
            y: e.offset_y() as f32,
        }
    }

    pub fn mouse_button_to_input(e: &MouseEvent, pressed: bool) -> InputEvent {
        InputEvent::MouseButton {
            button: MouseButton::from_web_button(e.button()),
            pressed,
            x: e.offset_x() as f32,
            y: e.offset_y() as f32,
        }
    }
}
