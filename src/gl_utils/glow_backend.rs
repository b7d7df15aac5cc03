//! [`Gpu`] implementation on top of `glow`.

use glow::HasContext;

use super::context::*;
use super::uniform::UniformValue;

/// A loaded GL function table. The owning window keeps the context current.
pub struct GlowGpu {
    gl: glow::Context,
}

impl GlowGpu {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }

    /// Raw access for calls the renderer does not wrap.
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

fn stage_enum(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => glow::VERTEX_SHADER,
        ShaderStage::Fragment => glow::FRAGMENT_SHADER,
    }
}

fn target_enum(target: BufferTarget) -> u32 {
    match target {
        BufferTarget::Array => glow::ARRAY_BUFFER,
        BufferTarget::ElementArray => glow::ELEMENT_ARRAY_BUFFER,
    }
}

fn usage_enum(usage: BufferUsage) -> u32 {
    match usage {
        BufferUsage::StaticDraw => glow::STATIC_DRAW,
        BufferUsage::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsage::StreamDraw => glow::STREAM_DRAW,
    }
}

fn topology_enum(topology: Topology) -> u32 {
    match topology {
        Topology::Points => glow::POINTS,
        Topology::Lines => glow::LINES,
        Topology::LineStrip => glow::LINE_STRIP,
        Topology::LineLoop => glow::LINE_LOOP,
        Topology::Triangles => glow::TRIANGLES,
        Topology::TriangleStrip => glow::TRIANGLE_STRIP,
        Topology::TriangleFan => glow::TRIANGLE_FAN,
    }
}

fn format_enum(format: PixelFormat) -> u32 {
    match format {
        PixelFormat::Red => glow::RED,
        PixelFormat::Rgb => glow::RGB,
        PixelFormat::Rgba => glow::RGBA,
    }
}

fn wrap_enum(wrap: TextureWrap) -> i32 {
    (match wrap {
        TextureWrap::Repeat => glow::REPEAT,
        TextureWrap::ClampToEdge => glow::CLAMP_TO_EDGE,
        TextureWrap::MirroredRepeat => glow::MIRRORED_REPEAT,
    }) as i32
}

fn filter_enum(filter: TextureFilter) -> i32 {
    (match filter {
        TextureFilter::Nearest => glow::NEAREST,
        TextureFilter::Linear => glow::LINEAR,
        TextureFilter::LinearMipmapLinear => glow::LINEAR_MIPMAP_LINEAR,
    }) as i32
}

fn capability_enum(capability: Capability) -> u32 {
    match capability {
        Capability::DepthTest => glow::DEPTH_TEST,
        Capability::StencilTest => glow::STENCIL_TEST,
        Capability::Blend => glow::BLEND,
        Capability::CullFace => glow::CULL_FACE,
    }
}

impl Gpu for GlowGpu {
    fn compile_shader(&self, stage: ShaderStage, source: &str) -> Result<ShaderHandle, String> {
        unsafe {
            let shader = self.gl.create_shader(stage_enum(stage))?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(log);
            }
            Ok(ShaderHandle(shader.0))
        }
    }

    fn link_program(
        &self,
        vertex: ShaderHandle,
        fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        unsafe {
            let program = self.gl.create_program()?;
            let vertex = glow::NativeShader(vertex.0);
            let fragment = glow::NativeShader(fragment.0);
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(log);
            }
            Ok(ProgramHandle(program.0))
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        unsafe { self.gl.delete_shader(glow::NativeShader(shader.0)) }
    }

    fn delete_program(&self, program: ProgramHandle) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) }
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        unsafe {
            self.gl
                .use_program(program.map(|p| glow::NativeProgram(p.0)))
        }
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let location = glow::NativeUniformLocation(location.0);
        let loc = Some(&location);
        unsafe {
            match *value {
                UniformValue::Float(x) => self.gl.uniform_1_f32(loc, x),
                UniformValue::Vec2([x, y]) => self.gl.uniform_2_f32(loc, x, y),
                UniformValue::Vec3([x, y, z]) => self.gl.uniform_3_f32(loc, x, y, z),
                UniformValue::Vec4([x, y, z, w]) => self.gl.uniform_4_f32(loc, x, y, z, w),
                UniformValue::Int(x) => self.gl.uniform_1_i32(loc, x),
                UniformValue::IVec2([x, y]) => self.gl.uniform_2_i32(loc, x, y),
                UniformValue::IVec3([x, y, z]) => self.gl.uniform_3_i32(loc, x, y, z),
                UniformValue::IVec4([x, y, z, w]) => self.gl.uniform_4_i32(loc, x, y, z, w),
                UniformValue::Bool(x) => self.gl.uniform_1_i32(loc, x as i32),
                UniformValue::BVec2([x, y]) => self.gl.uniform_2_i32(loc, x as i32, y as i32),
                UniformValue::BVec3([x, y, z]) => {
                    self.gl
                        .uniform_3_i32(loc, x as i32, y as i32, z as i32)
                }
                UniformValue::BVec4([x, y, z, w]) => {
                    self.gl
                        .uniform_4_i32(loc, x as i32, y as i32, z as i32, w as i32)
                }
                UniformValue::Mat3(mat) => {
                    let data: &[f32; 9] = mat.as_ref();
                    self.gl.uniform_matrix_3_f32_slice(loc, false, data)
                }
                UniformValue::Mat4(mat) => {
                    let data: &[f32; 16] = mat.as_ref();
                    self.gl.uniform_matrix_4_f32_slice(loc, false, data)
                }
            }
        }
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        unsafe { self.gl.create_buffer().map(|b| BufferHandle(b.0)) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl
                .bind_buffer(target_enum(target), buffer.map(|b| glow::NativeBuffer(b.0)))
        }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(target_enum(target), data, usage_enum(usage))
        }
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(glow::NativeBuffer(buffer.0)) }
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        unsafe { self.gl.create_vertex_array().map(|v| VertexArrayHandle(v.0)) }
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>) {
        unsafe {
            self.gl
                .bind_vertex_array(vao.map(|v| glow::NativeVertexArray(v.0)))
        }
    }

    fn delete_vertex_array(&self, vao: VertexArrayHandle) {
        unsafe { self.gl.delete_vertex_array(glow::NativeVertexArray(vao.0)) }
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, glow::FLOAT, normalized, stride, offset)
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        unsafe { self.gl.create_texture().map(|t| TextureHandle(t.0)) }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(|t| glow::NativeTexture(t.0)))
        }
    }

    fn texture_parameter(&self, parameter: TextureParameter) {
        let (name, value) = match parameter {
            TextureParameter::WrapS(wrap) => (glow::TEXTURE_WRAP_S, wrap_enum(wrap)),
            TextureParameter::WrapT(wrap) => (glow::TEXTURE_WRAP_T, wrap_enum(wrap)),
            TextureParameter::MinFilter(filter) => (glow::TEXTURE_MIN_FILTER, filter_enum(filter)),
            TextureParameter::MagFilter(filter) => (glow::TEXTURE_MAG_FILTER, filter_enum(filter)),
        };
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, name, value) }
    }

    fn texture_image_2d(&self, width: u32, height: u32, format: PixelFormat, pixels: &[u8]) {
        let format = format_enum(format);
        unsafe {
            // Rows of RGB and single-channel images are not 4-byte aligned.
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                width as i32,
                height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
        }
    }

    fn generate_mipmap(&self) {
        unsafe { self.gl.generate_mipmap(glow::TEXTURE_2D) }
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(glow::NativeTexture(texture.0)) }
    }

    fn draw_elements(&self, topology: Topology, count: u32) {
        unsafe {
            self.gl
                .draw_elements(topology_enum(topology), count as i32, glow::UNSIGNED_INT, 0)
        }
    }

    fn clear(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl
                .clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);
        }
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        let capability = capability_enum(capability);
        unsafe {
            if enabled {
                self.gl.enable(capability);
            } else {
                self.gl.disable(capability);
            }
        }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { self.gl.viewport(0, 0, width as i32, height as i32) }
    }

    fn get_error(&self) -> u32 {
        unsafe { self.gl.get_error() }
    }
}
