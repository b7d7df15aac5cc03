//! Shader program cache
//!
//! Programs are compiled once per vertex/fragment source pair and shared by
//! every object that names the same pair. Objects hold a [`ProgramId`] into
//! the cache rather than owning the GL program.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{Error, Result};
use crate::gl_utils::{Gpu, ProgramHandle, ShaderStage, UniformLocation, UniformValue};

/// Where a shader stage's GLSL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderSource {
    File(PathBuf),
    Inline(String),
}

impl ShaderSource {
    /// A string without whitespace is a path relative to `base_dir`;
    /// anything else is GLSL source text.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        if raw.contains(char::is_whitespace) {
            Self::Inline(raw.to_string())
        } else {
            Self::File(base_dir.join(raw))
        }
    }

    pub fn identifier(&self) -> Cow<'_, str> {
        match self {
            Self::File(path) => path.to_string_lossy(),
            Self::Inline(source) => Cow::Borrowed(source),
        }
    }

    pub fn read(&self) -> Result<String> {
        match self {
            Self::File(path) => std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
                path: path.clone(),
                source,
            }),
            Self::Inline(source) => Ok(source.clone()),
        }
    }
}

/// A vertex/fragment pair as written in a scene file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSpec {
    pub vertex: ShaderSource,
    pub fragment: ShaderSource,
}

impl ShaderSpec {
    pub fn new(vertex: &str, fragment: &str, base_dir: &Path) -> Self {
        Self {
            vertex: ShaderSource::parse(vertex, base_dir),
            fragment: ShaderSource::parse(fragment, base_dir),
        }
    }

    /// Parses `{"vertex": ..., "fragment": ...}`.
    pub fn from_json(value: &Value, base_dir: &Path) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::MalformedDescriptor("shader must be an object".into()))?;
        let stage = |key: &str| {
            object.get(key).and_then(Value::as_str).ok_or_else(|| {
                Error::MalformedDescriptor(format!("shader.{key} must be a string"))
            })
        };
        Ok(Self::new(stage("vertex")?, stage("fragment")?, base_dir))
    }

    /// Deduplication key: the two identifiers concatenated.
    pub fn key(&self) -> String {
        format!("{}{}", self.vertex.identifier(), self.fragment.identifier())
    }
}

/// Index of a program inside a [`ShaderCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(usize);

/// A linked program plus its lazily filled uniform locations.
#[derive(Debug)]
pub struct ShaderProgram {
    key: String,
    handle: ProgramHandle,
    uniforms: HashMap<String, Option<UniformLocation>>,
}

impl ShaderProgram {
    pub fn handle(&self) -> ProgramHandle {
        self.handle
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn activate(&self, gpu: &dyn Gpu) {
        gpu.use_program(Some(self.handle));
    }

    /// Resolves `name` once; unknown names are cached as `None`.
    pub fn location(&mut self, gpu: &dyn Gpu, name: &str) -> Option<UniformLocation> {
        if let Some(location) = self.uniforms.get(name) {
            return *location;
        }
        let location = gpu.uniform_location(self.handle, name);
        if location.is_none() {
            log::debug!("uniform {name:?} is not active in program {:?}", self.handle);
        }
        self.uniforms.insert(name.to_string(), location);
        location
    }

    /// Writes a uniform of this program. The program must be active.
    /// Writing a name the program does not use is a no-op.
    pub fn set_uniform(&mut self, gpu: &dyn Gpu, name: &str, value: impl Into<UniformValue>) {
        if let Some(location) = self.location(gpu, name) {
            gpu.set_uniform(location, &value.into());
        }
    }
}

/// Process-lifetime store of compiled programs, keyed by source identity.
#[derive(Debug, Default)]
pub struct ShaderCache {
    programs: Vec<ShaderProgram>,
    by_key: HashMap<String, ProgramId>,
    compiles: usize,
}

impl ShaderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `spec`, compiling and linking it on first use.
    ///
    /// # Arguments
    /// * `gpu` - GL seam used for compiling and linking
    /// * `spec` - Vertex and fragment sources; their identifiers form the cache key
    ///
    /// # Returns
    /// Id of the cached program, or the driver log on compile or link failure
    pub fn program(&mut self, gpu: &dyn Gpu, spec: &ShaderSpec) -> Result<ProgramId> {
        let key = spec.key();
        if let Some(&id) = self.by_key.get(&key) {
            log::debug!("shader cache hit for program {:?}", self.programs[id.0].handle);
            return Ok(id);
        }

        let vertex_source = spec.vertex.read()?;
        let fragment_source = spec.fragment.read()?;

        self.compiles += 1;
        let vertex = gpu
            .compile_shader(ShaderStage::Vertex, &vertex_source)
            .map_err(Error::CompileError)?;
        let fragment = match gpu.compile_shader(ShaderStage::Fragment, &fragment_source) {
            Ok(fragment) => fragment,
            Err(log) => {
                gpu.delete_shader(vertex);
                return Err(Error::CompileError(log));
            }
        };

        let linked = gpu.link_program(vertex, fragment);
        gpu.delete_shader(vertex);
        gpu.delete_shader(fragment);
        let handle = linked.map_err(Error::LinkError)?;

        log::info!(
            "linked shader program {:?} ({} + {})",
            handle,
            spec.vertex.identifier(),
            spec.fragment.identifier()
        );

        let id = ProgramId(self.programs.len());
        self.programs.push(ShaderProgram {
            key: key.clone(),
            handle,
            uniforms: HashMap::new(),
        });
        self.by_key.insert(key, id);
        Ok(id)
    }

    pub fn get(&self, id: ProgramId) -> &ShaderProgram {
        &self.programs[id.0]
    }

    pub fn get_mut(&mut self, id: ProgramId) -> &mut ShaderProgram {
        &mut self.programs[id.0]
    }

    /// Number of compile/link attempts made so far.
    pub fn compile_count(&self) -> usize {
        self.compiles
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Deletes every program. Ids handed out earlier are invalid afterwards.
    pub fn release_all(&mut self, gpu: &dyn Gpu) {
        for program in self.programs.drain(..) {
            gpu.delete_program(program.handle);
        }
        self.by_key.clear();
    }
}
