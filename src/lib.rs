//! glscene
//!
//! An OpenGL scene renderer. Scenes are JSON documents of *definitions*
//! (geometry, shaders, textures or an OBJ model) and *usages* (placed
//! instances, materials and lights); [`Scene`] parses them without a GL
//! context and draws them each frame through a [`RenderContext`].

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod gl_utils;

// Re-export main types for convenience
pub use config::AppConfig;
pub use error::{Error, Result};
pub use gfx::{RenderContext, Scene};
