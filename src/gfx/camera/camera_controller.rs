use std::collections::{HashMap, HashSet};

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseScrollDelta},
    keyboard::KeyCode,
};

use super::fly_camera::{FlyCamera, MoveDirection};

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputCommand {
    Move(MoveDirection),
    ReleaseCursor,
    CaptureCursor,
    Exit,
}

/// Key bindings, looked up by key and press/release.
///
/// Movement commands are held: they apply every frame while the key is
/// down. Other commands fire once on the bound transition.
#[derive(Debug, Clone)]
pub struct InputBindings {
    on_press: HashMap<KeyCode, InputCommand>,
    on_release: HashMap<KeyCode, InputCommand>,
}

impl InputBindings {
    pub fn empty() -> Self {
        Self {
            on_press: HashMap::new(),
            on_release: HashMap::new(),
        }
    }

    pub fn bind_press(mut self, key: KeyCode, command: InputCommand) -> Self {
        self.on_press.insert(key, command);
        self
    }

    pub fn bind_release(mut self, key: KeyCode, command: InputCommand) -> Self {
        self.on_release.insert(key, command);
        self
    }

    pub fn lookup(&self, key: KeyCode, state: ElementState) -> Option<InputCommand> {
        match state {
            ElementState::Pressed => self.on_press.get(&key).copied(),
            ElementState::Released => self.on_release.get(&key).copied(),
        }
    }
}

impl Default for InputBindings {
    /// WASD to move, hold left Alt to free the cursor, Escape to quit.
    fn default() -> Self {
        Self::empty()
            .bind_press(KeyCode::KeyW, InputCommand::Move(MoveDirection::Front))
            .bind_press(KeyCode::KeyS, InputCommand::Move(MoveDirection::Back))
            .bind_press(KeyCode::KeyA, InputCommand::Move(MoveDirection::Left))
            .bind_press(KeyCode::KeyD, InputCommand::Move(MoveDirection::Right))
            .bind_press(KeyCode::AltLeft, InputCommand::ReleaseCursor)
            .bind_release(KeyCode::AltLeft, InputCommand::CaptureCursor)
            .bind_press(KeyCode::Escape, InputCommand::Exit)
    }
}

pub struct CameraController {
    bindings: InputBindings,
    held: HashSet<MoveDirection>,
    /// Mouse look only applies while the cursor is captured.
    captured: bool,
}

impl CameraController {
    pub fn new(bindings: InputBindings) -> Self {
        Self {
            bindings,
            held: HashSet::new(),
            captured: true,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Feeds a key transition. Movement keys are tracked internally; any
    /// other bound command is returned for the window to act on.
    pub fn process_key(&mut self, key: KeyCode, state: ElementState) -> Option<InputCommand> {
        let movement = self
            .bindings
            .lookup(key, ElementState::Pressed)
            .and_then(|command| match command {
                InputCommand::Move(direction) => Some(direction),
                _ => None,
            });
        if let Some(direction) = movement {
            match state {
                ElementState::Pressed => self.held.insert(direction),
                ElementState::Released => self.held.remove(&direction),
            };
            return None;
        }

        let command = self.bindings.lookup(key, state)?;
        match command {
            InputCommand::ReleaseCursor => self.captured = false,
            InputCommand::CaptureCursor => self.captured = true,
            _ => {}
        }
        Some(command)
    }

    pub fn process_mouse_motion(&mut self, camera: &mut FlyCamera, delta: (f64, f64)) {
        if self.captured {
            // screen y grows downwards
            camera.look(delta.0 as f32, -delta.1 as f32);
        }
    }

    pub fn process_scroll(&mut self, camera: &mut FlyCamera, delta: &MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => *y,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => *y as f32 / 20.0,
        };
        camera.zoom_by(lines);
    }

    /// Applies held movement keys for a frame of `delta` seconds.
    pub fn update(&self, camera: &mut FlyCamera, delta: f32) {
        for &direction in &self.held {
            camera.advance(direction, delta);
        }
    }

    /// Drops held keys, e.g. when the window loses focus.
    pub fn reset(&mut self) {
        self.held.clear();
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new(InputBindings::default())
    }
}
