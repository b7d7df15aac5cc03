//! Headless [`Gpu`] used by the unit tests.
//!
//! Records every call in order, hands out sequential handles, and remembers
//! which uniform name each location belongs to so tests can assert on
//! `Uniform { name, value }` entries directly.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::num::NonZeroU32;

use super::context::*;
use super::uniform::UniformValue;

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCall {
    CompileShader(ShaderStage),
    LinkProgram(ProgramHandle),
    DeleteShader(ShaderHandle),
    DeleteProgram(ProgramHandle),
    UseProgram(Option<ProgramHandle>),
    UniformLocation(String),
    Uniform { name: String, value: UniformValue },
    CreateBuffer(BufferHandle),
    BindBuffer(BufferTarget, Option<BufferHandle>),
    BufferData { target: BufferTarget, bytes: usize, usage: BufferUsage },
    DeleteBuffer(BufferHandle),
    CreateVertexArray(VertexArrayHandle),
    BindVertexArray(Option<VertexArrayHandle>),
    DeleteVertexArray(VertexArrayHandle),
    VertexAttribPointer { index: u32, size: i32, normalized: bool, stride: i32, offset: i32 },
    EnableVertexAttribArray(u32),
    CreateTexture(TextureHandle),
    ActiveTexture(u32),
    BindTexture(Option<TextureHandle>),
    TextureParameter(TextureParameter),
    TextureImage2d { width: u32, height: u32, format: PixelFormat },
    GenerateMipmap,
    DeleteTexture(TextureHandle),
    DrawElements { topology: Topology, count: u32 },
    Clear([f32; 4]),
    SetCapability(Capability, bool),
    Viewport(u32, u32),
}

#[derive(Default)]
pub struct RecordingGpu {
    calls: RefCell<Vec<GpuCall>>,
    next_id: Cell<u32>,
    locations: RefCell<HashMap<(ProgramHandle, String), UniformLocation>>,
    location_names: RefCell<HashMap<UniformLocation, String>>,
    missing_uniforms: RefCell<HashSet<String>>,
    compile_failure: RefCell<Option<String>>,
    link_failure: RefCell<Option<String>>,
    pending_error: Cell<u32>,
}

impl RecordingGpu {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> NonZeroU32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        NonZeroU32::new(id).expect("handle counter starts at 1")
    }

    fn record(&self, call: GpuCall) {
        self.calls.borrow_mut().push(call);
    }

    pub fn calls(&self) -> Vec<GpuCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Makes every later compile fail with `log`.
    pub fn fail_compiles(&self, log: &str) {
        *self.compile_failure.borrow_mut() = Some(log.to_string());
    }

    /// Makes every later link fail with `log`.
    pub fn fail_links(&self, log: &str) {
        *self.link_failure.borrow_mut() = Some(log.to_string());
    }

    /// Uniform names the "driver" reports as inactive.
    pub fn hide_uniform(&self, name: &str) {
        self.missing_uniforms.borrow_mut().insert(name.to_string());
    }

    pub fn raise_error(&self, code: u32) {
        self.pending_error.set(code);
    }

    pub fn count(&self, pred: impl Fn(&GpuCall) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| pred(call)).count()
    }

    pub fn draw_count(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::DrawElements { .. }))
    }

    pub fn compile_count(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::CompileShader(_)))
    }

    /// Values written to the named uniform, oldest first.
    pub fn uniform_writes(&self, name: &str) -> Vec<UniformValue> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                GpuCall::Uniform { name: n, value } if n == name => Some(*value),
                _ => None,
            })
            .collect()
    }
}

impl Gpu for RecordingGpu {
    fn compile_shader(&self, stage: ShaderStage, _source: &str) -> Result<ShaderHandle, String> {
        self.record(GpuCall::CompileShader(stage));
        if let Some(log) = self.compile_failure.borrow().clone() {
            return Err(log);
        }
        Ok(ShaderHandle(self.next()))
    }

    fn link_program(
        &self,
        _vertex: ShaderHandle,
        _fragment: ShaderHandle,
    ) -> Result<ProgramHandle, String> {
        if let Some(log) = self.link_failure.borrow().clone() {
            return Err(log);
        }
        let program = ProgramHandle(self.next());
        self.record(GpuCall::LinkProgram(program));
        Ok(program)
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        self.record(GpuCall::DeleteShader(shader));
    }

    fn delete_program(&self, program: ProgramHandle) {
        self.record(GpuCall::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramHandle>) {
        self.record(GpuCall::UseProgram(program));
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        self.record(GpuCall::UniformLocation(name.to_string()));
        if self.missing_uniforms.borrow().contains(name) {
            return None;
        }
        let mut locations = self.locations.borrow_mut();
        let location = *locations
            .entry((program, name.to_string()))
            .or_insert_with(|| UniformLocation(self.next().get()));
        self.location_names
            .borrow_mut()
            .insert(location, name.to_string());
        Some(location)
    }

    fn set_uniform(&self, location: UniformLocation, value: &UniformValue) {
        let name = self
            .location_names
            .borrow()
            .get(&location)
            .cloned()
            .unwrap_or_default();
        self.record(GpuCall::Uniform { name, value: *value });
    }

    fn create_buffer(&self) -> Result<BufferHandle, String> {
        let buffer = BufferHandle(self.next());
        self.record(GpuCall::CreateBuffer(buffer));
        Ok(buffer)
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<BufferHandle>) {
        self.record(GpuCall::BindBuffer(target, buffer));
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8], usage: BufferUsage) {
        self.record(GpuCall::BufferData {
            target,
            bytes: data.len(),
            usage,
        });
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        self.record(GpuCall::DeleteBuffer(buffer));
    }

    fn create_vertex_array(&self) -> Result<VertexArrayHandle, String> {
        let vao = VertexArrayHandle(self.next());
        self.record(GpuCall::CreateVertexArray(vao));
        Ok(vao)
    }

    fn bind_vertex_array(&self, vao: Option<VertexArrayHandle>) {
        self.record(GpuCall::BindVertexArray(vao));
    }

    fn delete_vertex_array(&self, vao: VertexArrayHandle) {
        self.record(GpuCall::DeleteVertexArray(vao));
    }

    fn vertex_attrib_pointer(
        &self,
        index: u32,
        size: i32,
        normalized: bool,
        stride: i32,
        offset: i32,
    ) {
        self.record(GpuCall::VertexAttribPointer {
            index,
            size,
            normalized,
            stride,
            offset,
        });
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        self.record(GpuCall::EnableVertexAttribArray(index));
    }

    fn create_texture(&self) -> Result<TextureHandle, String> {
        let texture = TextureHandle(self.next());
        self.record(GpuCall::CreateTexture(texture));
        Ok(texture)
    }

    fn active_texture(&self, unit: u32) {
        self.record(GpuCall::ActiveTexture(unit));
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        self.record(GpuCall::BindTexture(texture));
    }

    fn texture_parameter(&self, parameter: TextureParameter) {
        self.record(GpuCall::TextureParameter(parameter));
    }

    fn texture_image_2d(&self, width: u32, height: u32, format: PixelFormat, _pixels: &[u8]) {
        self.record(GpuCall::TextureImage2d {
            width,
            height,
            format,
        });
    }

    fn generate_mipmap(&self) {
        self.record(GpuCall::GenerateMipmap);
    }

    fn delete_texture(&self, texture: TextureHandle) {
        self.record(GpuCall::DeleteTexture(texture));
    }

    fn draw_elements(&self, topology: Topology, count: u32) {
        self.record(GpuCall::DrawElements { topology, count });
    }

    fn clear(&self, color: [f32; 4]) {
        self.record(GpuCall::Clear(color));
    }

    fn set_capability(&self, capability: Capability, enabled: bool) {
        self.record(GpuCall::SetCapability(capability, enabled));
    }

    fn viewport(&self, width: u32, height: u32) {
        self.record(GpuCall::Viewport(width, height));
    }

    fn get_error(&self) -> u32 {
        self.pending_error.replace(0)
    }
}
