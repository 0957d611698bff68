//! Keyboard and mouse input.
//!
//! [`Input`] turns raw window events into per-frame state (key just pressed,
//! key held, drag delta, wheel delta). [`KeyboardControls`] reads that state
//! and produces [`ControlAction`]s: parameter updates for the
//! [`ParameterChannel`](crate::params::ParameterChannel), camera moves, pause
//! and quit.
//!
//! | Key            | Action                          |
//! |----------------|---------------------------------|
//! | `C` / `Shift+C`| next / previous constant        |
//! | `Q` / `A`      | rotation speed up / down        |
//! | `W` / `S`      | breathe speed up / down         |
//! | `E` / `D`      | spiral tightness up / down      |
//! | `R` / `F`      | color shift up / down           |
//! | `T` / `G`      | opacity up / down               |
//! | `Up` / `Down`  | double / halve particle count   |
//! | `Space`        | pause                           |
//! | `0`            | reset camera                    |
//! | `Escape`       | quit                            |
//!
//! Left-drag orbits the camera and the wheel zooms.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

use crate::params::{ParamUpdate, SimulationParameters};

/// Step for speed, tightness and color shift adjustments.
pub const SLIDER_STEP: f32 = 0.1;
/// Step for opacity adjustments.
pub const OPACITY_STEP: f32 = 0.05;
/// Upper bound for keyboard particle-count changes.
pub const MAX_KEYBOARD_PARTICLES: u32 = 1_000_000;

const ORBIT_SENSITIVITY: f32 = 0.005;

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// Keys the controls respond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A, C, D, E, F, G, Q, R, S, T, W,
    Key0,
    Up, Down,
    Space, Escape, Shift,
    Other,
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::KeyA => KeyCode::A,
            WinitKeyCode::KeyC => KeyCode::C,
            WinitKeyCode::KeyD => KeyCode::D,
            WinitKeyCode::KeyE => KeyCode::E,
            WinitKeyCode::KeyF => KeyCode::F,
            WinitKeyCode::KeyG => KeyCode::G,
            WinitKeyCode::KeyQ => KeyCode::Q,
            WinitKeyCode::KeyR => KeyCode::R,
            WinitKeyCode::KeyS => KeyCode::S,
            WinitKeyCode::KeyT => KeyCode::T,
            WinitKeyCode::KeyW => KeyCode::W,
            WinitKeyCode::Digit0 => KeyCode::Key0,
            WinitKeyCode::ArrowUp => KeyCode::Up,
            WinitKeyCode::ArrowDown => KeyCode::Down,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            WinitKeyCode::ShiftLeft | WinitKeyCode::ShiftRight => KeyCode::Shift,
            _ => KeyCode::Other,
        }
    }
}

/// Input state tracking for keyboard and mouse.
#[derive(Debug, Default)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,

    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: f32,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a key went down since the last [`begin_frame`](Self::begin_frame).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Cursor movement since the last frame, in pixels.
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Wheel movement since the last frame; positive scrolls up.
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// Clear the per-frame state. Held keys and buttons persist.
    pub fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
        self.scroll_delta = 0.0;
    }

    /// Record a key transition.
    pub fn press_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // no auto-repeat
                if self.keys_held.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    /// Record a cursor position in window pixels.
    pub fn move_cursor(&mut self, position: Vec2) {
        if let Some(last) = self.mouse_position {
            self.mouse_delta += position - last;
        }
        self.mouse_position = Some(position);
    }

    /// Process a winit window event.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.press_key(KeyCode::from(code), event.state);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let btn = MouseButton::from(*button);
                match state {
                    ElementState::Pressed => {
                        self.mouse_held.insert(btn);
                    }
                    ElementState::Released => {
                        self.mouse_held.remove(&btn);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.move_cursor(Vec2::new(position.x as f32, position.y as f32));
            }

            WindowEvent::CursorLeft { .. } => {
                self.mouse_position = None;
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
            }

            _ => {}
        }
    }
}

/// Something the user asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlAction {
    /// Push a parameter update.
    Update(ParamUpdate),
    /// Orbit the camera by (yaw, pitch) radians.
    Orbit(Vec2),
    /// Zoom the camera; positive moves closer.
    Zoom(f32),
    ResetCamera,
    TogglePause,
    Quit,
}

/// Maps input state to [`ControlAction`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyboardControls;

impl KeyboardControls {
    /// Collect this frame's actions against the current parameters.
    pub fn actions(&self, input: &Input, params: &SimulationParameters) -> Vec<ControlAction> {
        let mut actions = Vec::new();
        let c = params.continuous;
        let s = params.structural;

        if input.key_pressed(KeyCode::Escape) {
            actions.push(ControlAction::Quit);
        }
        if input.key_pressed(KeyCode::Space) {
            actions.push(ControlAction::TogglePause);
        }
        if input.key_pressed(KeyCode::Key0) {
            actions.push(ControlAction::ResetCamera);
        }

        if input.key_pressed(KeyCode::C) {
            let constant = if input.key_held(KeyCode::Shift) {
                s.constant.previous()
            } else {
                s.constant.next()
            };
            actions.push(ControlAction::Update(ParamUpdate::Constant(constant)));
        }

        if input.key_pressed(KeyCode::Up) {
            let count = s.particle_count.max(1).saturating_mul(2).min(MAX_KEYBOARD_PARTICLES);
            actions.push(ControlAction::Update(ParamUpdate::ParticleCount(count)));
        }
        if input.key_pressed(KeyCode::Down) {
            actions.push(ControlAction::Update(ParamUpdate::ParticleCount(s.particle_count / 2)));
        }

        let stepped = |up: KeyCode, down: KeyCode, value: f32, step: f32| -> Option<f32> {
            let dir = match (input.key_pressed(up), input.key_pressed(down)) {
                (true, false) => 1.0,
                (false, true) => -1.0,
                _ => return None,
            };
            Some(step_value(value, dir * step))
        };

        if let Some(v) = stepped(KeyCode::Q, KeyCode::A, c.rotation_speed, SLIDER_STEP) {
            actions.push(ControlAction::Update(ParamUpdate::RotationSpeed(v)));
        }
        if let Some(v) = stepped(KeyCode::W, KeyCode::S, c.breathe_speed, SLIDER_STEP) {
            actions.push(ControlAction::Update(ParamUpdate::BreatheSpeed(v)));
        }
        if let Some(v) = stepped(KeyCode::E, KeyCode::D, c.spiral_tightness, SLIDER_STEP) {
            actions.push(ControlAction::Update(ParamUpdate::SpiralTightness(v)));
        }
        if let Some(v) = stepped(KeyCode::R, KeyCode::F, c.color_shift, SLIDER_STEP) {
            actions.push(ControlAction::Update(ParamUpdate::ColorShift(v)));
        }
        if let Some(v) = stepped(KeyCode::T, KeyCode::G, c.particle_opacity, OPACITY_STEP) {
            actions.push(ControlAction::Update(ParamUpdate::Opacity(v)));
        }

        if input.mouse_held(MouseButton::Left) && input.mouse_delta() != Vec2::ZERO {
            actions.push(ControlAction::Orbit(input.mouse_delta() * ORBIT_SENSITIVITY));
        }
        if input.scroll_delta() != 0.0 {
            actions.push(ControlAction::Zoom(input.scroll_delta()));
        }

        actions
    }
}

/// Move `value` by `delta` and snap to the grid of `|delta|`.
fn step_value(value: f32, delta: f32) -> f32 {
    let step = delta.abs();
    (((value + delta) / step).round() * step * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MathConstant;

    fn press(input: &mut Input, key: KeyCode) {
        input.press_key(key, ElementState::Pressed);
    }

    #[test]
    fn test_pressed_clears_held_persists() {
        let mut input = Input::new();
        press(&mut input, KeyCode::Space);
        assert!(input.key_pressed(KeyCode::Space));
        input.begin_frame();
        assert!(input.key_held(KeyCode::Space));
        assert!(!input.key_pressed(KeyCode::Space));
        // repeat while held does not re-fire
        press(&mut input, KeyCode::Space);
        assert!(!input.key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_cursor_delta_accumulates() {
        let mut input = Input::new();
        input.move_cursor(Vec2::new(10.0, 10.0));
        assert_eq!(input.mouse_delta(), Vec2::ZERO);
        input.move_cursor(Vec2::new(13.0, 8.0));
        input.move_cursor(Vec2::new(15.0, 8.0));
        assert_eq!(input.mouse_delta(), Vec2::new(5.0, -2.0));
    }

    #[test]
    fn test_slider_keys() {
        let mut input = Input::new();
        press(&mut input, KeyCode::Q);
        press(&mut input, KeyCode::G);
        let actions = KeyboardControls.actions(&input, &SimulationParameters::default());
        assert!(actions.contains(&ControlAction::Update(ParamUpdate::RotationSpeed(1.1))));
        assert!(actions.contains(&ControlAction::Update(ParamUpdate::Opacity(0.6))));
    }

    #[test]
    fn test_constant_cycling_with_shift() {
        let mut input = Input::new();
        press(&mut input, KeyCode::C);
        let params = SimulationParameters::default();
        assert_eq!(
            KeyboardControls.actions(&input, &params),
            vec![ControlAction::Update(ParamUpdate::Constant(MathConstant::Pi))]
        );

        input.begin_frame();
        input.press_key(KeyCode::C, ElementState::Released);
        press(&mut input, KeyCode::Shift);
        press(&mut input, KeyCode::C);
        assert_eq!(
            KeyboardControls.actions(&input, &params),
            vec![ControlAction::Update(ParamUpdate::Constant(MathConstant::EPiQuarter))]
        );
    }

    #[test]
    fn test_particle_count_keys() {
        let mut input = Input::new();
        press(&mut input, KeyCode::Down);
        let actions = KeyboardControls.actions(&input, &SimulationParameters::default());
        assert_eq!(actions, vec![ControlAction::Update(ParamUpdate::ParticleCount(22_500))]);
    }

    #[test]
    fn test_step_value_snaps() {
        assert_eq!(step_value(0.65, 0.05), 0.7);
        assert_eq!(step_value(0.3, -0.1), 0.2);
        assert_eq!(step_value(1.0, 0.1), 1.1);
    }
}
