//! The GPU seam.
//!
//! Every GL call the loaders and the draw pass make goes through [`Gpu`].
//! The production implementation is [`GlowGpu`](super::glow_backend::GlowGpu);
//! tests swap in a recorder that logs calls instead of touching a driver.
//!
//! All methods assume the GL context is current on the calling thread.

use std::num::NonZeroU32;

use super::uniform::UniformValue;

/// Compiled shader stage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub NonZeroU32);

/// Linked program object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramHandle(pub NonZeroU32);

/// Array or element buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(pub NonZeroU32);

/// Texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub NonZeroU32);

/// Vertex array object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexArrayHandle(pub NonZeroU32);

/// Resolved uniform location inside one program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Array,
    ElementArray,
}

/// Usage hint passed to buffer uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    #[default]
    StaticDraw,
    DynamicDraw,
    StreamDraw,
}

/// Primitive assembly mode for indexed draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// Pixel layout of uploaded texture data, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Red,
    Rgb,
    Rgba,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Repeat,
    ClampToEdge,
    MirroredRepeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

/// Sampling parameter for the currently bound 2D texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    WrapS(TextureWrap),
    WrapT(TextureWrap),
    MinFilter(TextureFilter),
    MagFilter(TextureFilter),
}

/// Fixed-function state toggled at the start of each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    StencilTest,
    Blend,
    CullFace,
}

/// The subset of OpenGL the renderer needs.
///
/// Object creation returns the driver's message on failure. Everything else
/// mirrors the GL call of the same name.
pub trait Gpu {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String>;
    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String>;
    fn delete_shader(&self, shader: ShaderHandle);
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: Option<ProgramHandle>);
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn set_uniform(&self, location: UniformLocation, value: &UniformValue);

    fn create_buffer(&self) -> Result<BufferHandle, String>;
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>);
    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage);
    fn delete_buffer(&self, buffer: BufferHandle);

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String>;
    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>);
    fn delete_vertex_array(&self, vao: VertexArrayHandle);
    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    );
    fn enable_vertex_attrib_array(&self, index: u32);

    fn create_texture(&self) -> Result<TextureHandle, String>;
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<TextureHandle>);
    fn texture_parameter(&self, parameter: TextureParameter);
    fn texture_image_2d(&self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]);
    fn generate_mipmap(&self);
    fn delete_texture(&self, texture: TextureHandle);

    fn draw_elements(&self, topology: Topology, count: u32);

    fn clear(&self, color: [f32; 4]);
    fn set_capability(&self, capability: Capability, enabled: bool);
    fn viewport(&self, width: u32, height: u32);

    /// Returns the oldest pending error code, or 0 when there is none.
    fn get_error(&self) -> u32;
}
