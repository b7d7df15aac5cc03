// src/gl_utils/mod.rs
//! OpenGL utility layer
//!
//! Wraps the handful of GL entry points the renderer needs behind the [`Gpu`]
//! trait, plus the typed [`UniformValue`] payload.

pub mod context;
pub mod glow_backend;
pub mod uniform;

#[cfg(test)]
pub(crate) mod recording;

// Re-export main types
pub use context::*;
pub use glow_backend::GlowGpu;
pub use uniform::UniformValue;
