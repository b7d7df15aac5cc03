//! # Camera
//!
//! A first-person [`FlyCamera`] and the [`CameraController`] that turns
//! window input into camera motion through an [`InputBindings`] table.

pub mod camera_controller;
pub mod fly_camera;

// Re-export main types
pub use camera_controller::{CameraController, InputBindings, InputCommand};
pub use fly_camera::{CameraSettings, FlyCamera, MoveDirection};
