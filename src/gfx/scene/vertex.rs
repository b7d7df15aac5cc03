//! # Geometry Buffers
//!
//! CPU-side vertex and index data plus the GL buffer objects they upload to.
//!
//! A [`VertexBuffer`] is a flat list of floats with a layout giving the
//! component count of each attribute, e.g. `[3, 3, 2]` for
//! position/normal/uv. An [`IndexBuffer`] is a list of `u32` indices with a
//! primitive [`Topology`].

use serde_json::Value;

use crate::error::{Error, Result};
use crate::gl_utils::{BufferHandle, BufferTarget, BufferUsage, Gpu, Topology};

use super::json::{field, float_array, string, uint_array};

/// Behaviour shared by vertex and index buffers.
pub trait GeometryBuffer {
    fn target(&self) -> BufferTarget;

    /// GL buffer object, once uploaded.
    fn handle(&self) -> Option<BufferHandle>;

    /// Number of elements (floats or indices).
    fn len(&self) -> usize;

    fn byte_size(&self) -> usize;

    /// Creates the buffer object if needed, binds it and fills it.
    fn upload(&mut self, gpu: &dyn Gpu, usage: BufferUsage) -> Result<()>;

    /// Declares attribute pointers for the bound buffer.
    fn set_vertex_pointer(&self, gpu: &dyn Gpu, normalize: bool) -> Result<()>;

    fn release(&mut self, gpu: &dyn Gpu);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bind(&self, gpu: &dyn Gpu) {
        gpu.bind_buffer(self.target(), self.handle());
    }
}

fn upload_bytes(
    gpu: &dyn Gpu,
    handle: &mut Option<BufferHandle>,
    target: BufferTarget,
    bytes: &[u8],
    usage: BufferUsage,
) -> Result<()> {
    let buffer = match *handle {
        Some(buffer) => buffer,
        None => {
            let buffer = gpu.create_buffer().map_err(Error::GpuResource)?;
            *handle = Some(buffer);
            buffer
        }
    };
    gpu.bind_buffer(target, Some(buffer));
    gpu.buffer_data(target, bytes, usage);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct VertexBuffer {
    data: Vec<f32>,
    layout: Vec<u32>,
    stride: u32,
    handle: Option<BufferHandle>,
}

impl VertexBuffer {
    /// Fails with [`Error::IncompleteVertexData`] unless `data` holds a whole
    /// number of vertices for `layout`.
    pub fn build(data: Vec<f32>, layout: Vec<u32>) -> Result<Self> {
        let stride: u32 = layout.iter().sum();
        if stride == 0 || data.len() % stride as usize != 0 {
            return Err(Error::IncompleteVertexData {
                len: data.len(),
                stride,
            });
        }
        Ok(Self {
            data,
            layout,
            stride,
            handle: None,
        })
    }

    /// Parses `{"value": [f32...], "structure": [u32...]}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let err = Error::MalformedDescriptor;
        let data = float_array(field(value, "value", err)?, "vertex.value", err)?;
        let layout = uint_array(field(value, "structure", err)?, "vertex.structure", err)?;
        Self::build(data, layout)
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn layout(&self) -> &[u32] {
        &self.layout
    }

    /// Floats per vertex.
    pub fn stride_length(&self) -> u32 {
        self.stride
    }

    pub fn vertex_count(&self) -> usize {
        self.data.len() / self.stride as usize
    }
}

impl GeometryBuffer for VertexBuffer {
    fn target(&self) -> BufferTarget {
        BufferTarget::Array
    }

    fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of_val(self.data.as_slice())
    }

    fn upload(&mut self, gpu: &dyn Gpu, usage: BufferUsage) -> Result<()> {
        upload_bytes(
            gpu,
            &mut self.handle,
            BufferTarget::Array,
            bytemuck::cast_slice(&self.data),
            usage,
        )
    }

    fn set_vertex_pointer(&self, gpu: &dyn Gpu, normalize: bool) -> Result<()> {
        let float = std::mem::size_of::<f32>() as i32;
        let stride = self.stride as i32 * float;
        let mut offset = 0;
        for (index, &size) in self.layout.iter().enumerate() {
            let index = index as u32;
            gpu.vertex_attrib_pointer(index, size as i32, normalize, stride, offset * float);
            gpu.enable_vertex_attrib_array(index);
            offset += size as i32;
        }
        Ok(())
    }

    fn release(&mut self, gpu: &dyn Gpu) {
        if let Some(buffer) = self.handle.take() {
            gpu.delete_buffer(buffer);
        }
    }
}

/// Maps a scene-file primitive name to its topology.
pub fn topology_from_name(name: &str) -> Result<Topology> {
    Ok(match name {
        "point" => Topology::Points,
        "line" => Topology::Lines,
        "continue_line" => Topology::LineStrip,
        "loop" => Topology::LineLoop,
        "triangle" => Topology::Triangles,
        "continue_triangle" => Topology::TriangleStrip,
        "fan_triangle" => Topology::TriangleFan,
        other => return Err(Error::UnknownPrimitive(other.to_string())),
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexBuffer {
    data: Vec<u32>,
    topology: Topology,
    handle: Option<BufferHandle>,
}

impl IndexBuffer {
    pub fn build(data: Vec<u32>, primitive: &str) -> Result<Self> {
        Ok(Self::with_topology(data, topology_from_name(primitive)?))
    }

    pub fn with_topology(data: Vec<u32>, topology: Topology) -> Self {
        Self {
            data,
            topology,
            handle: None,
        }
    }

    /// Parses `{"value": [u32...], "primitive": name}`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let err = Error::MalformedDescriptor;
        let data = uint_array(field(value, "value", err)?, "indice.value", err)?;
        let primitive = string(field(value, "primitive", err)?, "indice.primitive", err)?;
        Self::build(data, primitive)
    }

    pub fn data(&self) -> &[u32] {
        &self.data
    }

    pub fn topology(&self) -> Topology {
        self.topology
    }
}

impl GeometryBuffer for IndexBuffer {
    fn target(&self) -> BufferTarget {
        BufferTarget::ElementArray
    }

    fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn byte_size(&self) -> usize {
        std::mem::size_of_val(self.data.as_slice())
    }

    fn upload(&mut self, gpu: &dyn Gpu, usage: BufferUsage) -> Result<()> {
        upload_bytes(
            gpu,
            &mut self.handle,
            BufferTarget::ElementArray,
            bytemuck::cast_slice(&self.data),
            usage,
        )
    }

    fn set_vertex_pointer(&self, _gpu: &dyn Gpu, _normalize: bool) -> Result<()> {
        Err(Error::NotApplicable(
            "index buffers have no vertex attribute layout",
        ))
    }

    fn release(&mut self, gpu: &dyn Gpu) {
        if let Some(buffer) = self.handle.take() {
            gpu.delete_buffer(buffer);
        }
    }
}
