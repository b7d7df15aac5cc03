use cgmath::*;
use serde::Deserialize;

pub const PITCH_LIMIT: f32 = 89.0;
pub const ZOOM_MIN: f32 = 5.0;
pub const ZOOM_MAX: f32 = 60.0;
pub const Z_NEAR: f32 = 0.1;
pub const Z_FAR: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Front,
    Back,
    Left,
    Right,
}

/// Starting pose and speeds, as read from the app config.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: [f32; 3],
    /// Degrees; 0 looks down +X, -90 looks down -Z.
    pub yaw: f32,
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub zoom: f32,
    /// World units per second.
    pub move_speed: f32,
    /// Degrees per pixel of mouse motion.
    pub view_speed: f32,
    /// Degrees per scroll line.
    pub zoom_speed: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 6.0],
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            move_speed: 4.0,
            view_speed: 0.1,
            zoom_speed: 1.0,
        }
    }
}

/// First-person camera with a fixed world up of +Y.
#[derive(Debug, Clone, Copy)]
pub struct FlyCamera {
    pub position: Vector3<f32>,
    yaw: f32,
    pitch: f32,
    zoom: f32,
    pub move_speed: f32,
    pub view_speed: f32,
    pub zoom_speed: f32,
    world_up: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
}

impl FlyCamera {
    pub fn new(settings: CameraSettings) -> Self {
        let mut camera = Self {
            position: settings.position.into(),
            yaw: 0.0,
            pitch: 0.0,
            zoom: settings.zoom.clamp(ZOOM_MIN, ZOOM_MAX),
            move_speed: settings.move_speed,
            view_speed: settings.view_speed,
            zoom_speed: settings.zoom_speed,
            world_up: Vector3::unit_y(),
            front: -Vector3::unit_z(),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
        };
        camera.set_orientation(settings.yaw, settings.pitch);
        camera
    }

    /// Sets yaw and pitch in degrees. Pitch is clamped to ±89°, yaw wraps
    /// into [0, 360).
    pub fn set_orientation(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw.rem_euclid(360.0);
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);

        let (yaw, pitch) = (Deg(self.yaw), Deg(self.pitch));
        self.front = Vector3::new(
            pitch.cos() * yaw.cos(),
            pitch.sin(),
            pitch.cos() * yaw.sin(),
        )
        .normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn facing(&self) -> Vector3<f32> {
        self.front
    }

    /// Moves along the view direction or its right vector for `delta` seconds.
    pub fn advance(&mut self, direction: MoveDirection, delta: f32) {
        let step = self.move_speed * delta;
        match direction {
            MoveDirection::Front => self.position += self.front * step,
            MoveDirection::Back => self.position -= self.front * step,
            MoveDirection::Left => self.position -= self.right * step,
            MoveDirection::Right => self.position += self.right * step,
        }
    }

    /// Turns by a mouse offset in pixels; positive `dy` looks up.
    pub fn look(&mut self, dx: f32, dy: f32) {
        self.set_orientation(
            self.yaw + dx * self.view_speed,
            self.pitch + dy * self.view_speed,
        );
    }

    pub fn zoom_by(&mut self, lines: f32) {
        self.zoom = (self.zoom + lines * self.zoom_speed).clamp(ZOOM_MIN, ZOOM_MAX);
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        let eye = Point3::from_vec(self.position);
        Matrix4::look_at_rh(eye, eye + self.front, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Matrix4<f32> {
        perspective(Deg(self.zoom), aspect, Z_NEAR, Z_FAR)
    }
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self::new(CameraSettings::default())
    }
}
