//! # Scene Module
//!
//! Scene files, the objects they describe and the per-frame draw traversal.
//!
//! ## Key Components
//!
//! - [`Scene`] - Definitions, usages and lights loaded from one scene file
//! - [`SingleObject`] - One VAO with its buffers, shader and textures
//! - [`VertexBuffer`] / [`IndexBuffer`] - Geometry and its GL buffer objects
//! - [`InstanceDescriptor`] - One placed copy of a definition
//! - [`import_model`] - OBJ meshes as [`PlainModel`]s
//!
//! ## Usage
//!
//! ```no_run
//! use glscene::gfx::scene::{FrameContext, Scene};
//!
//! // Parse without a GL context, allocate once one exists:
//! let scene = Scene::load("assets/scene.json", None).unwrap();
//! // scene.allocate_default(&mut ctx)?;
//! // scene.draw(&mut ctx, &FrameContext::default())?;
//! ```
//!
//! ## Scene file layout
//!
//! A scene is a JSON array of entries:
//! - `definition` entries carry inline `vertex`/`indice`/`shader`/`texture`
//!   blocks or a `model` reference to an OBJ file
//! - `usage` entries carry an `attribute` list placing copies of the
//!   definition with the same name

pub(crate) mod json;

pub mod importer;
pub mod object;
pub mod scene;
pub mod usage;
pub mod vertex;

// Re-export main types
pub use importer::{import_model, ModelVertex, PlainModel};
pub use object::{SingleObject, TextureSlot, MAX_TEXTURE_UNIT};
pub use scene::{normal_matrix, ObjectDefinition, Scene, SceneState};
pub use usage::{
    FrameContext, InstanceDescriptor, InstanceTransform, LightKey, LightSource, Material,
    ObjectUsage, Orbit, Spin,
};
pub use vertex::{topology_from_name, GeometryBuffer, IndexBuffer, VertexBuffer};
