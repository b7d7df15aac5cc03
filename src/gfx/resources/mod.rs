// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Shader programs and textures shared between scene objects, and the
//! [`RenderContext`] that owns both caches.

pub mod render_context;
pub mod shader_program;
pub mod texture_resource;

// Re-export main types
pub use render_context::RenderContext;
pub use shader_program::{ProgramId, ShaderCache, ShaderProgram, ShaderSource, ShaderSpec};
pub use texture_resource::{
    RawImage, Texture, TextureKind, TextureRegistry, TextureSource,
};
