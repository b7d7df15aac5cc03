//! # Graphics Module
//!
//! Scene loading, GPU resources and the camera used by the window loop.
//!
//! ## Architecture Overview
//!
//! - **Resources** ([`resources`]) - Shader program cache, texture registry and
//!   the [`RenderContext`] that owns them
//! - **Scene** ([`scene`]) - Scene files, drawable objects and the draw pass
//! - **Camera** ([`camera`]) - Fly camera and input bindings
//!
//! ## Usage
//!
//! ```no_run
//! use glscene::gfx::{scene::Scene, RenderContext};
//!
//! // let mut ctx = RenderContext::new(gpu);
//! // let scene = Scene::load("assets/scene.json", Some(&mut ctx))?;
//! ```
//!
//! [`RenderContext`]: resources::RenderContext

pub mod camera;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::FlyCamera;
pub use resources::RenderContext;
pub use scene::Scene;
