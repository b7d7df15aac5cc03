//! # Single Object
//!
//! One drawable unit: a vertex buffer and an index buffer bound together by a
//! VAO, the shader program that draws them and the textures it samples.
//!
//! Objects are built without touching the GPU ([`SingleObject::from_json`],
//! [`SingleObject::from_model`]) and uploaded later with
//! [`SingleObject::allocate`].

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::gfx::resources::{
    ProgramId, RenderContext, ShaderProgram, ShaderSpec, Texture, TextureKind, TextureSource,
};
use crate::gl_utils::{BufferUsage, Gpu, VertexArrayHandle};

use super::importer::{ModelVertex, PlainModel};
use super::json::{field, string};
use super::vertex::{GeometryBuffer, IndexBuffer, VertexBuffer};

/// Highest texture unit index a single object may use.
pub const MAX_TEXTURE_UNIT: u32 = 16;

/// A named sampler and where its pixels come from.
#[derive(Debug, Clone)]
pub struct TextureSlot {
    source: TextureSource,
    kind: TextureKind,
    texture: Option<Texture>,
}

impl TextureSlot {
    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    /// Registry reference, present once allocated.
    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }
}

#[derive(Debug)]
pub struct SingleObject {
    vertices: VertexBuffer,
    indices: IndexBuffer,
    shader: Option<ShaderSpec>,
    program: Option<ProgramId>,
    textures: BTreeMap<String, TextureSlot>,
    vao: Option<VertexArrayHandle>,
}

impl SingleObject {
    pub fn new(vertices: VertexBuffer, indices: IndexBuffer) -> Self {
        Self {
            vertices,
            indices,
            shader: None,
            program: None,
            textures: BTreeMap::new(),
            vao: None,
        }
    }

    /// Builds an object from an inline definition with `vertex`, `indice`,
    /// `shader` and an optional `texture` list. Relative paths resolve
    /// against `base_dir`.
    pub fn from_json(descriptor: &Value, base_dir: &Path) -> Result<Self> {
        let err = Error::MalformedDescriptor;
        let vertices = VertexBuffer::from_json(field(descriptor, "vertex", err)?)?;
        let indices = IndexBuffer::from_json(field(descriptor, "indice", err)?)?;
        let shader = ShaderSpec::from_json(field(descriptor, "shader", err)?, base_dir)?;

        let mut object = Self::new(vertices, indices);
        object.set_shader(shader);

        if let Some(list) = descriptor.get("texture") {
            let entries = list
                .as_array()
                .ok_or_else(|| err("texture must be an array".into()))?;
            for entry in entries {
                let name = string(field(entry, "name", err)?, "texture.name", err)?;
                let file = string(field(entry, "file", err)?, "texture.file", err)?;
                let kind = TextureKind::parse(string(field(entry, "type", err)?, "texture.type", err)?)?;
                object.add_texture(name, TextureSource::File(base_dir.join(file)), kind);
            }
        }
        Ok(object)
    }

    /// Wraps one imported mesh. The shader is left unassigned.
    pub fn from_model(model: PlainModel) -> Result<Self> {
        let vertices = VertexBuffer::build(
            model.raw_vertices().to_vec(),
            ModelVertex::LAYOUT.to_vec(),
        )?;
        let indices = IndexBuffer::with_topology(model.indices, crate::gl_utils::Topology::Triangles);
        let mut object = Self::new(vertices, indices);
        for (name, source) in model.textures {
            object.add_texture(&name, source, TextureKind::D2);
        }
        Ok(object)
    }

    pub fn set_shader(&mut self, shader: ShaderSpec) {
        self.shader = Some(shader);
        self.program = None;
    }

    /// Adds or replaces the sampler `name`. Takes effect on the next allocation.
    pub fn add_texture(&mut self, name: &str, source: TextureSource, kind: TextureKind) {
        self.textures.insert(
            name.to_string(),
            TextureSlot {
                source,
                kind,
                texture: None,
            },
        );
    }

    pub fn vertices(&self) -> &VertexBuffer {
        &self.vertices
    }

    pub fn indices(&self) -> &IndexBuffer {
        &self.indices
    }

    pub fn shader(&self) -> Option<&ShaderSpec> {
        self.shader.as_ref()
    }

    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    pub fn textures(&self) -> &BTreeMap<String, TextureSlot> {
        &self.textures
    }

    pub fn vao(&self) -> Option<VertexArrayHandle> {
        self.vao
    }

    pub fn is_allocated(&self) -> bool {
        self.vao.is_some()
    }

    /// Creates the VAO and fills both buffers inside it, then resolves the
    /// shader program and texture references through the context caches.
    ///
    /// # Arguments
    /// * `ctx` - GPU seam plus the shader and texture caches
    /// * `usage` - Buffer usage hint for both uploads
    /// * `normalize` - Whether vertex attributes are normalized
    ///
    /// # Returns
    /// `Ok(())` once the object can be drawn; a no-op if already allocated
    pub fn allocate(
        &mut self,
        ctx: &mut RenderContext,
        usage: BufferUsage,
        normalize: bool,
    ) -> Result<()> {
        if self.vao.is_some() {
            return Ok(());
        }
        let gpu = ctx.gpu.as_ref();

        if let Some(shader) = &self.shader {
            self.program = Some(ctx.shaders.program(gpu, shader)?);
        }

        for slot in self.textures.values_mut() {
            if slot.texture.is_some() {
                continue;
            }
            let id = slot.source.identifier();
            slot.texture = Some(ctx.textures.load(gpu, &id, &slot.source, slot.kind)?);
        }

        let vao = gpu.create_vertex_array().map_err(Error::GpuResource)?;
        self.vao = Some(vao);
        gpu.bind_vertex_array(Some(vao));
        self.vertices.upload(gpu, usage)?;
        self.indices.upload(gpu, usage)?;
        self.vertices.set_vertex_pointer(gpu, normalize)?;
        gpu.bind_vertex_array(None);
        Ok(())
    }

    /// Binds every texture to consecutive units from 0 and points the
    /// sampler uniform of the same name at its unit.
    pub fn bind_textures(&self, gpu: &dyn Gpu, program: &mut ShaderProgram) -> Result<()> {
        let needed = self.textures.len() as u32;
        if needed > MAX_TEXTURE_UNIT + 1 {
            return Err(Error::TooManyTextureUnits {
                needed,
                max: MAX_TEXTURE_UNIT + 1,
            });
        }
        for (unit, (name, slot)) in self.textures.iter().enumerate() {
            let unit = unit as u32;
            gpu.active_texture(unit);
            match &slot.texture {
                Some(texture) => texture.bind(gpu),
                None => gpu.bind_texture(None),
            }
            program.set_uniform(gpu, name, unit as i32);
        }
        Ok(())
    }

    /// Binds the VAO and issues one indexed draw.
    pub fn draw(&self, gpu: &dyn Gpu) -> Result<()> {
        let vao = self.vao.ok_or(Error::NotAllocated)?;
        gpu.bind_vertex_array(Some(vao));
        gpu.draw_elements(self.indices.topology(), self.indices.len() as u32);
        Ok(())
    }

    /// Deletes the VAO and buffers and drops the texture references.
    /// The shader program stays in the cache.
    pub fn release(&mut self, ctx: &mut RenderContext) {
        let gpu = ctx.gpu.as_ref();
        if let Some(vao) = self.vao.take() {
            gpu.delete_vertex_array(vao);
        }
        self.vertices.release(gpu);
        self.indices.release(gpu);
        for slot in self.textures.values_mut() {
            if let Some(texture) = slot.texture.take() {
                ctx.textures.release(gpu, &texture);
            }
        }
        self.program = None;
    }
}
