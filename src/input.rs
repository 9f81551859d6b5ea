//! Maps window input onto simulation triggers.
//!
//! | Input                      | Trigger                          |
//! |----------------------------|----------------------------------|
//! | Left click (no drag)       | [`Trigger::Burst`] at the cursor |
//! | Left drag                  | [`CameraControl::Rotate`]        |
//! | Scroll wheel               | [`CameraControl::Zoom`]          |
//! | Arrow keys                 | [`CameraControl::Pan`]           |
//! | Space                      | [`Trigger::SuperBurst`]          |
//!
//! The mapper keeps just enough state to tell a click from a drag. The
//! `mouse_button`, `cursor_moved`, `scroll` and `key` methods are pure
//! state transitions, so the mapping can be tested without a window;
//! [`InputMapper::handle_event`] adapts winit events onto them.

use glam::Vec2;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::camera::CameraControl;
use crate::simulation::Trigger;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Back,
    Forward,
    Other(u16),
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Left => MouseButton::Left,
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            WinitMouseButton::Back => MouseButton::Back,
            WinitMouseButton::Forward => MouseButton::Forward,
            WinitMouseButton::Other(id) => MouseButton::Other(id),
        }
    }
}

/// The keys the shows respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    Space,
    Escape,
    P,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::ArrowLeft => KeyCode::Left,
            WinitKeyCode::ArrowRight => KeyCode::Right,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::KeyP => KeyCode::P,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Turns mouse and keyboard input into [`Trigger`]s.
#[derive(Debug, Clone)]
pub struct InputMapper {
    cursor: Vec2,
    /// Where the left button went down, while it is held.
    press_at: Option<Vec2>,
    dragging: bool,
    /// Pixels the cursor must travel before a press becomes a drag.
    pub drag_threshold: f32,
    /// Radians of rotation per pixel dragged.
    pub rotate_speed: f32,
    /// Pixels panned per arrow key press.
    pub pan_step: f32,
    /// Zoom multiplier per scroll line.
    pub zoom_step: f32,
}

impl InputMapper {
    pub fn new() -> Self {
        Self {
            cursor: Vec2::ZERO,
            press_at: None,
            dragging: false,
            drag_threshold: 4.0,
            rotate_speed: 0.005,
            pan_step: 20.0,
            zoom_step: 1.1,
        }
    }

    /// Last known cursor position in pixels.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    /// Whether the left button is held and has moved past the drag threshold.
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn mouse_button(&mut self, button: MouseButton, pressed: bool) -> Option<Trigger> {
        if button != MouseButton::Left {
            return None;
        }
        if pressed {
            self.press_at = Some(self.cursor);
            self.dragging = false;
            return None;
        }
        let was_pressed = self.press_at.take().is_some();
        let was_dragging = std::mem::replace(&mut self.dragging, false);
        if was_pressed && !was_dragging {
            Some(Trigger::Burst { at: self.cursor })
        } else {
            None
        }
    }

    pub fn cursor_moved(&mut self, position: Vec2) -> Option<Trigger> {
        let delta = position - self.cursor;
        self.cursor = position;

        let start = self.press_at?;
        if !self.dragging && position.distance(start) > self.drag_threshold {
            self.dragging = true;
        }
        if !self.dragging {
            return None;
        }
        Some(Trigger::Camera(CameraControl::Rotate {
            yaw: delta.x * self.rotate_speed,
            pitch: delta.y * self.rotate_speed,
        }))
    }

    /// `lines` is positive when scrolling up, which zooms in.
    pub fn scroll(&mut self, lines: f32) -> Option<Trigger> {
        if lines == 0.0 {
            return None;
        }
        Some(Trigger::Camera(CameraControl::Zoom(self.zoom_step.powf(lines))))
    }

    pub fn key(&mut self, key: KeyCode) -> Option<Trigger> {
        let pan = |x: f32, y: f32| Some(Trigger::Camera(CameraControl::Pan(Vec2::new(x, y))));
        match key {
            KeyCode::Left => pan(-self.pan_step, 0.0),
            KeyCode::Right => pan(self.pan_step, 0.0),
            KeyCode::Up => pan(0.0, -self.pan_step),
            KeyCode::Down => pan(0.0, self.pan_step),
            KeyCode::Space => Some(Trigger::SuperBurst),
            _ => None,
        }
    }

    /// Process a winit window event. Key repeats are ignored.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<Trigger> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed || event.repeat {
                    return None;
                }
                match event.physical_key {
                    PhysicalKey::Code(code) => self.key(KeyCode::from(code)),
                    PhysicalKey::Unidentified(_) => None,
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(MouseButton::from(*button), *state == ElementState::Pressed)
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32))
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.scroll(lines)
            }
            _ => None,
        }
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}
