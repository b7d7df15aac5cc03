//! # Scene
//!
//! Parses a scene file into named definitions (what to draw) and usages
//! (where and how to draw it), registers the lights those usages declare,
//! and drives the per-frame draw traversal.
//!
//! A scene moves through [`SceneState::Empty`] → [`SceneState::Parsed`] →
//! [`SceneState::Allocated`]. Parsing never touches the GPU, so it can run
//! before a GL context exists; [`Scene::allocate`] uploads everything on the
//! context thread.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::gfx::resources::{ProgramId, RenderContext, ShaderProgram, ShaderSpec};
use crate::gl_utils::{BufferUsage, Gpu, UniformValue};

use super::importer::import_model;
use super::object::SingleObject;
use super::usage::{
    resolve_attributes, FrameContext, InstanceDescriptor, LightKey, LightSource, ObjectUsage,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SceneState {
    #[default]
    Empty,
    Parsed,
    Allocated,
}

/// A named drawable template: one object per imported mesh, or a single
/// inline object.
#[derive(Debug, Default)]
pub struct ObjectDefinition {
    pub objects: Vec<SingleObject>,
}

#[derive(Debug, Default)]
pub struct Scene {
    base_dir: PathBuf,
    definitions: Vec<(String, ObjectDefinition)>,
    definition_index: HashMap<String, usize>,
    usages: HashMap<String, ObjectUsage>,
    lights: BTreeMap<LightKey, LightSource>,
    state: SceneState,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses `path`. When `ctx` is given the scene is also
    /// allocated with static-draw buffers.
    ///
    /// # Arguments
    /// * `path` - Scene file; its directory becomes the base directory
    /// * `ctx` - Context to allocate into, or `None` to only parse
    ///
    /// # Returns
    /// The scene, `Parsed` or `Allocated` depending on `ctx`
    pub fn load(path: impl AsRef<Path>, ctx: Option<&mut RenderContext>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut scene = Self::parse_str(&text, base_dir)?;
        log::info!(
            "loaded scene {} ({} definitions, {} usages, {} lights)",
            path.display(),
            scene.definitions.len(),
            scene.usages.len(),
            scene.lights.len()
        );
        if let Some(ctx) = ctx {
            scene.allocate_default(ctx)?;
        }
        Ok(scene)
    }

    pub fn parse_str(text: &str, base_dir: &Path) -> Result<Self> {
        let json: Value = serde_json::from_str(text)?;
        Self::parse(&json, base_dir)
    }

    /// Builds definitions, usages and lights from a scene document. Paths in
    /// the document resolve against `base_dir`. Stops at the first error.
    ///
    /// # Arguments
    /// * `json` - Top-level array of `definition` and `usage` entries
    /// * `base_dir` - Directory that shader, texture and model paths are relative to
    ///
    /// # Returns
    /// A scene in [`SceneState::Parsed`]; nothing has been uploaded yet
    pub fn parse(json: &Value, base_dir: &Path) -> Result<Self> {
        let entries = json
            .as_array()
            .ok_or_else(|| Error::MalformedEntry("scene must be an array of entries".into()))?;

        let mut scene = Self {
            base_dir: base_dir.to_path_buf(),
            ..Self::default()
        };

        for (position, entry) in entries.iter().enumerate() {
            let kind = entry.get("type").and_then(Value::as_str);
            let name = entry.get("name").and_then(Value::as_str);
            let (Some(kind), Some(name)) = (kind, name) else {
                return Err(Error::MalformedEntry(format!(
                    "entry {position} needs string \"type\" and \"name\" fields"
                )));
            };
            match kind {
                "definition" => scene.parse_definition(entry, name)?,
                "usage" => scene.parse_usage(entry, name)?,
                other => return Err(Error::UnknownEntryType(other.to_string())),
            }
        }

        for name in scene.usages.keys() {
            if !scene.definition_index.contains_key(name) {
                log::warn!("usage {name:?} has no definition and will not be drawn");
            }
        }

        scene.state = SceneState::Parsed;
        Ok(scene)
    }

    fn parse_definition(&mut self, entry: &Value, name: &str) -> Result<()> {
        let objects = if let Some(model) = entry.get("model") {
            let file = model.get("name").and_then(Value::as_str).ok_or_else(|| {
                Error::MalformedDefinition(format!("{name}: model.name must be a path"))
            })?;
            let shader = entry
                .get("shader")
                .map(|shader| ShaderSpec::from_json(shader, &self.base_dir))
                .transpose()?;

            let mut objects = import_model(self.base_dir.join(file))?
                .into_iter()
                .map(SingleObject::from_model)
                .collect::<Result<Vec<_>>>()?;
            if let Some(shader) = shader {
                for object in &mut objects {
                    object.set_shader(shader.clone());
                }
            }
            objects
        } else if entry.get("vertex").is_some() || entry.get("indice").is_some() {
            vec![SingleObject::from_json(entry, &self.base_dir)?]
        } else {
            return Err(Error::MalformedDefinition(format!(
                "{name}: expected a model reference or inline vertex/indice/shader"
            )));
        };

        if self.definition_index.contains_key(name) {
            log::warn!("duplicate definition {name:?} ignored");
            return Ok(());
        }
        self.definition_index
            .insert(name.to_string(), self.definitions.len());
        self.definitions
            .push((name.to_string(), ObjectDefinition { objects }));
        Ok(())
    }

    fn parse_usage(&mut self, entry: &Value, name: &str) -> Result<()> {
        let first_index = self.usages.get(name).map_or(0, ObjectUsage::len);
        let resolved = resolve_attributes(entry, name, first_index)?;

        let usage = self.usages.entry(name.to_string()).or_default();
        for (instance, light) in resolved {
            usage.instances.push(instance);
            if let Some((key, source)) = light {
                self.lights.insert(key, source);
            }
        }
        Ok(())
    }

    /// Uploads every object of every definition.
    pub fn allocate(
        &mut self,
        ctx: &mut RenderContext,
        usage: BufferUsage,
        normalize: bool,
    ) -> Result<()> {
        for (_, definition) in &mut self.definitions {
            for object in &mut definition.objects {
                object.allocate(ctx, usage, normalize)?;
            }
        }
        self.state = SceneState::Allocated;
        log::info!(
            "allocated scene ({} programs, {} textures)",
            ctx.shaders.len(),
            ctx.textures.len()
        );
        Ok(())
    }

    pub fn allocate_default(&mut self, ctx: &mut RenderContext) -> Result<()> {
        self.allocate(ctx, BufferUsage::StaticDraw, false)
    }

    /// Frees VAOs, buffers and texture references. The scene can be
    /// allocated again afterwards.
    pub fn release(&mut self, ctx: &mut RenderContext) {
        for (_, definition) in &mut self.definitions {
            for object in &mut definition.objects {
                object.release(ctx);
            }
        }
        if self.state == SceneState::Allocated {
            self.state = SceneState::Parsed;
        }
    }

    /// Draws one frame.
    pub fn draw(&self, ctx: &mut RenderContext, frame: &FrameContext) -> Result<()> {
        if self.state != SceneState::Allocated {
            return Err(Error::NotAllocated);
        }
        let gpu = ctx.gpu.as_ref();

        for (name, definition) in &self.definitions {
            let usage = self.usages.get(name);
            for object in &definition.objects {
                let Some(program_id) = object.program() else {
                    log::debug!("{name}: sub-object without a shader skipped");
                    continue;
                };
                let program = ctx.shaders.get_mut(program_id);
                program.activate(gpu);
                program.set_uniform(gpu, "viewPos", frame.view_pos);
                program.set_uniform(gpu, "viewFacing", frame.view_facing);
                program.set_uniform(gpu, "view", frame.view);
                program.set_uniform(gpu, "projection", frame.projection);
                object.bind_textures(gpu, program)?;

                let Some(usage) = usage else {
                    continue;
                };

                for (key, light) in &self.lights {
                    self.push_light(gpu, program, key, light, frame);
                }

                for instance in &usage.instances {
                    push_instance(gpu, program, instance, frame);
                    object.draw(gpu)?;
                }
            }
        }
        Ok(())
    }

    fn push_light(
        &self,
        gpu: &dyn Gpu,
        program: &mut ShaderProgram,
        key: &LightKey,
        light: &LightSource,
        frame: &FrameContext,
    ) {
        let position = self
            .usages
            .get(&key.definition)
            .and_then(|usage| usage.instances.get(key.index))
            .map_or(Vector3::from(light.position), |instance| {
                instance.world_position(frame)
            });
        let name = &light.name;
        program.set_uniform(gpu, &format!("{name}.pos"), position);
        program.set_uniform(gpu, &format!("{name}.color"), light.color);
        program.set_uniform(gpu, &format!("{name}.strength"), light.strength);
        program.set_uniform(gpu, &format!("{name}.attenuation"), light.attenuation);
        program.set_uniform(gpu, &format!("{name}.direction"), light.direction);
        program.set_uniform(gpu, &format!("{name}.cutoff"), light.cutoff);
        program.set_uniform(gpu, &format!("{name}.outerCutoff"), light.outer_cutoff);
    }

    /// Sets the same uniforms on every program the scene draws with.
    pub fn apply_uniforms(&self, ctx: &mut RenderContext, uniforms: &[(String, UniformValue)]) {
        if uniforms.is_empty() {
            return;
        }
        let gpu = ctx.gpu.as_ref();
        let mut seen: Vec<ProgramId> = Vec::new();
        let programs = self
            .definitions
            .iter()
            .flat_map(|(_, definition)| &definition.objects)
            .filter_map(SingleObject::program);
        for id in programs {
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            let program = ctx.shaders.get_mut(id);
            program.activate(gpu);
            for (name, value) in uniforms {
                program.set_uniform(gpu, name, *value);
            }
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn definition(&self, name: &str) -> Option<&ObjectDefinition> {
        let index = *self.definition_index.get(name)?;
        Some(&self.definitions[index].1)
    }

    pub fn definition_mut(&mut self, name: &str) -> Option<&mut ObjectDefinition> {
        let index = *self.definition_index.get(name)?;
        Some(&mut self.definitions[index].1)
    }

    /// Definition names in draw order.
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.definitions.iter().map(|(name, _)| name.as_str())
    }

    pub fn usage(&self, name: &str) -> Option<&ObjectUsage> {
        self.usages.get(name)
    }

    pub fn usage_mut(&mut self, name: &str) -> Option<&mut ObjectUsage> {
        self.usages.get_mut(name)
    }

    /// Shortcut for attaching a transform hook to one instance.
    pub fn instance_mut(&mut self, name: &str, index: usize) -> Option<&mut InstanceDescriptor> {
        self.usages.get_mut(name)?.instance_mut(index)
    }

    pub fn lights(&self) -> &BTreeMap<LightKey, LightSource> {
        &self.lights
    }
}

fn push_instance(
    gpu: &dyn Gpu,
    program: &mut ShaderProgram,
    instance: &InstanceDescriptor,
    frame: &FrameContext,
) {
    let model = instance.model_matrix(frame);
    program.set_uniform(gpu, "model", model);
    program.set_uniform(gpu, "normalMat", normal_matrix(&model));
    match instance.color {
        Some(color) => program.set_uniform(gpu, "color", color),
        None => {
            let material = &instance.material;
            program.set_uniform(gpu, "material.ambient", material.ambient);
            program.set_uniform(gpu, "material.diffuse", material.diffuse);
            program.set_uniform(gpu, "material.specular", material.specular);
            program.set_uniform(gpu, "material.shininess", material.shininess);
        }
    }
}

/// Inverse-transpose of the upper 3×3; identity when it is singular.
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix3<f32> {
    let upper = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
    upper
        .invert()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Matrix3::identity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::usage::Orbit;
    use crate::gl_utils::recording::{GpuCall, RecordingGpu};
    use crate::gl_utils::Topology;
    use serde_json::json;
    use std::rc::Rc;

    const VERT: &str = "#version 330 core\nlayout (location = 0) in vec3 aPos;\nvoid main() {}";
    const FRAG: &str = "#version 330 core\nout vec4 FragColor;\nvoid main() {}";

    fn cube() -> Value {
        json!({
            "type": "definition",
            "name": "box",
            "vertex": {
                "value": [
                    -0.5, -0.5, -0.5,  0.5, -0.5, -0.5,  0.5,  0.5, -0.5, -0.5,  0.5, -0.5,
                    -0.5, -0.5,  0.5,  0.5, -0.5,  0.5,  0.5,  0.5,  0.5, -0.5,  0.5,  0.5
                ],
                "structure": [3]
            },
            "indice": {
                "value": [
                    0, 1, 2, 2, 3, 0,  4, 5, 6, 6, 7, 4,  0, 4, 7, 7, 3, 0,
                    1, 5, 6, 6, 2, 1,  3, 2, 6, 6, 7, 3,  0, 1, 5, 5, 4, 0
                ],
                "primitive": "triangle"
            },
            "shader": {"vertex": VERT, "fragment": FRAG}
        })
    }

    fn triangle(name: &str, indices: &[u32]) -> Value {
        json!({
            "type": "definition",
            "name": name,
            "vertex": {"value": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0], "structure": [3]},
            "indice": {"value": indices, "primitive": "triangle"},
            "shader": {"vertex": VERT, "fragment": FRAG}
        })
    }

    fn usage(name: &str, attributes: Value) -> Value {
        json!({"type": "usage", "name": name, "attribute": attributes})
    }

    fn lamp_attribute() -> Value {
        json!({
            "model": [0, 4, 0],
            "light": {
                "source": "pointLight",
                "color": [1, 1, 1],
                "attenuation": [1, 0.09, 0.032],
                "strength": 0.8
            }
        })
    }

    fn context() -> (Rc<RecordingGpu>, RenderContext) {
        let gpu = Rc::new(RecordingGpu::new());
        let ctx = RenderContext::new(gpu.clone());
        (gpu, ctx)
    }

    fn allocated(document: Value) -> (Rc<RecordingGpu>, RenderContext, Scene) {
        let (gpu, mut ctx) = context();
        let mut scene = Scene::parse(&document, Path::new(".")).unwrap();
        scene.allocate_default(&mut ctx).unwrap();
        gpu.clear_calls();
        (gpu, ctx, scene)
    }

    #[test]
    fn test_single_box_draws_once_with_default_material() {
        let (gpu, mut ctx, scene) =
            allocated(json!([cube(), usage("box", json!([{"model": [1, 2, 3]}]))]));

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        assert_eq!(gpu.draw_count(), 1);
        assert!(gpu.calls().contains(&GpuCall::DrawElements {
            topology: Topology::Triangles,
            count: 36
        }));
        assert_eq!(
            gpu.uniform_writes("model"),
            vec![UniformValue::Mat4(Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)))]
        );
        assert_eq!(
            gpu.uniform_writes("normalMat"),
            vec![UniformValue::Mat3(Matrix3::identity())]
        );
        for channel in ["material.ambient", "material.diffuse", "material.specular"] {
            assert_eq!(gpu.uniform_writes(channel), vec![UniformValue::Vec3([1.0; 3])]);
        }
        assert_eq!(
            gpu.uniform_writes("material.shininess"),
            vec![UniformValue::Float(32.0)]
        );
        assert!(gpu.uniform_writes("color").is_empty());
    }

    #[test]
    fn test_camera_uniforms_are_set_per_object() {
        let (gpu, mut ctx, scene) =
            allocated(json!([cube(), usage("box", json!([{"model": [0, 0, 0]}]))]));
        let frame = FrameContext {
            view_pos: Vector3::new(0.0, 0.0, 5.0),
            ..Default::default()
        };

        scene.draw(&mut ctx, &frame).unwrap();

        assert_eq!(gpu.uniform_writes("viewPos"), vec![UniformValue::Vec3([0.0, 0.0, 5.0])]);
        assert_eq!(gpu.uniform_writes("viewFacing"), vec![UniformValue::Vec3([0.0, 0.0, -1.0])]);
        assert_eq!(gpu.uniform_writes("view").len(), 1);
        assert_eq!(gpu.uniform_writes("projection").len(), 1);
    }

    #[test]
    fn test_usage_without_definition_draws_nothing() {
        let (gpu, mut ctx, scene) =
            allocated(json!([cube(), usage("ghost", json!([{"model": [0, 0, 0]}]))]));

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        assert_eq!(gpu.draw_count(), 0);
    }

    #[test]
    fn test_definition_without_usage_binds_but_does_not_draw() {
        let (gpu, mut ctx, scene) = allocated(json!([cube()]));

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        assert_eq!(gpu.draw_count(), 0);
        assert_eq!(gpu.count(|c| matches!(c, GpuCall::UseProgram(Some(_)))), 1);
    }

    #[test]
    fn test_eighteen_textures_exceed_unit_limit() {
        let dir = std::env::temp_dir().join("glscene_scene_textures");
        std::fs::create_dir_all(&dir).unwrap();
        let mut textures = Vec::new();
        for i in 0..18 {
            let file = format!("t{i:02}.png");
            image::GrayImage::from_pixel(1, 1, image::Luma([i as u8]))
                .save(dir.join(&file))
                .unwrap();
            textures.push(json!({"name": format!("sampler{i:02}"), "file": file, "type": "2d"}));
        }
        let mut definition = cube();
        definition["texture"] = Value::Array(textures);

        let (_gpu, mut ctx) = context();
        let mut scene = Scene::parse(
            &json!([definition, usage("box", json!([{"model": [0, 0, 0]}]))]),
            &dir,
        )
        .unwrap();
        scene.allocate_default(&mut ctx).unwrap();

        assert!(matches!(
            scene.draw(&mut ctx, &FrameContext::default()),
            Err(Error::TooManyTextureUnits { needed: 18, max: 17 })
        ));
    }

    #[test]
    fn test_light_uniforms_reach_every_drawn_program() {
        let (gpu, mut ctx, scene) = allocated(json!([
            cube(),
            triangle("lamp", &[0, 1, 2]),
            usage("box", json!([{"model": [0, 0, 0]}])),
            usage("lamp", json!([lamp_attribute()])),
        ]));
        assert_eq!(scene.lights().len(), 1);

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        // box and lamp share one program, so each draw pass pushes the light
        assert_eq!(
            gpu.uniform_writes("pointLight.pos"),
            vec![UniformValue::Vec3([0.0, 4.0, 0.0]); 2]
        );
        assert_eq!(
            gpu.uniform_writes("pointLight.strength")[0],
            UniformValue::Vec3([0.8; 3])
        );
        assert_eq!(gpu.uniform_writes("pointLight.cutoff")[0], UniformValue::Float(0.0));
        // the lamp instance uses its light colour instead of the material
        assert_eq!(gpu.uniform_writes("color"), vec![UniformValue::Vec3([1.0; 3])]);
        assert_eq!(gpu.uniform_writes("material.ambient").len(), 1);
    }

    #[test]
    fn test_light_follows_its_transform_hook() {
        let (gpu, mut ctx, mut scene) = allocated(json!([
            triangle("lamp", &[0, 1, 2]),
            usage("lamp", json!([lamp_attribute()])),
        ]));
        scene
            .instance_mut("lamp", 0)
            .unwrap()
            .set_transform(Orbit { radius: 5.0, height: 2.0, speed: 1.0 });

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        assert_eq!(
            gpu.uniform_writes("pointLight.pos"),
            vec![UniformValue::Vec3([5.0, 4.0, 2.0])]
        );
    }

    #[test]
    fn test_repeated_usage_entries_append() {
        let scene = Scene::parse(
            &json!([
                triangle("lamp", &[0, 1, 2]),
                usage("lamp", json!([{"model": [0, 0, 0]}])),
                usage("lamp", json!([lamp_attribute()])),
            ]),
            Path::new("."),
        )
        .unwrap();

        assert_eq!(scene.usage("lamp").unwrap().len(), 2);
        let key = scene.lights().keys().next().unwrap();
        assert_eq!(key, &LightKey { definition: "lamp".into(), index: 1 });
    }

    #[test]
    fn test_definitions_draw_in_insertion_order() {
        let (gpu, mut ctx, scene) = allocated(json!([
            triangle("zeta", &[0, 1, 2]),
            triangle("alpha", &[0, 1, 2, 2, 1, 0]),
            usage("alpha", json!([{"model": [0, 0, 0]}])),
            usage("zeta", json!([{"model": [0, 0, 0]}])),
        ]));
        assert_eq!(scene.definition_names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        let counts: Vec<u32> = gpu
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GpuCall::DrawElements { count, .. } => Some(count),
                _ => None,
            })
            .collect();
        assert_eq!(counts, vec![3, 6]);
    }

    #[test]
    fn test_duplicate_definition_keeps_first() {
        let scene = Scene::parse(
            &json!([triangle("tri", &[0, 1, 2]), triangle("tri", &[0, 1, 2, 2, 1, 0])]),
            Path::new("."),
        )
        .unwrap();

        let definition = scene.definition("tri").unwrap();
        assert_eq!(definition.objects[0].indices().data().len(), 3);
        assert_eq!(scene.definition_names().count(), 1);
    }

    #[test]
    fn test_shared_shader_compiles_once() {
        let (gpu, mut ctx) = context();
        let mut scene = Scene::parse(
            &json!([cube(), triangle("a", &[0, 1, 2]), triangle("b", &[0, 1, 2])]),
            Path::new("."),
        )
        .unwrap();
        scene.allocate_default(&mut ctx).unwrap();

        assert_eq!(ctx.shaders.compile_count(), 1);
        assert_eq!(gpu.compile_count(), 2);
    }

    #[test]
    fn test_malformed_entries() {
        let cases = [
            (json!({"type": "usage"}), "object"),
            (json!([{"name": "box"}]), "type"),
            (json!([{"type": "usage", "name": 3}]), "name"),
            (json!([{"type": 1, "name": "box"}]), "type number"),
        ];
        for (document, label) in cases {
            assert!(
                matches!(Scene::parse(&document, Path::new(".")), Err(Error::MalformedEntry(_))),
                "{label}"
            );
        }
        assert!(matches!(
            Scene::parse(&json!([{"type": "camera", "name": "main"}]), Path::new(".")),
            Err(Error::UnknownEntryType(_))
        ));
        assert!(matches!(
            Scene::parse(&json!([{"type": "definition", "name": "box"}]), Path::new(".")),
            Err(Error::MalformedDefinition(_))
        ));
        assert!(matches!(
            Scene::parse(&json!([{"type": "usage", "name": "box"}]), Path::new(".")),
            Err(Error::MalformedUsage(_))
        ));
        assert!(matches!(
            Scene::parse(&json!([usage("box", json!([{"rotate": {}}]))]), Path::new(".")),
            Err(Error::MalformedUsage(_))
        ));
    }

    #[test]
    fn test_draw_requires_allocation() {
        let (gpu, mut ctx) = context();
        let scene = Scene::parse(
            &json!([cube(), usage("box", json!([{"model": [0, 0, 0]}]))]),
            Path::new("."),
        )
        .unwrap();

        assert_eq!(scene.state(), SceneState::Parsed);
        assert!(gpu.calls().is_empty());
        assert!(matches!(
            scene.draw(&mut ctx, &FrameContext::default()),
            Err(Error::NotAllocated)
        ));
        assert_eq!(Scene::new().state(), SceneState::Empty);
    }

    #[test]
    fn test_model_definition_shares_shader_across_meshes() {
        let dir = std::env::temp_dir().join("glscene_scene_model");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("two.obj"),
            "o a\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no b\nv 0 0 1\nv 1 0 1\nv 0 1 1\nf 4 5 6\n",
        )
        .unwrap();

        let document = json!([
            {"type": "definition", "name": "pair", "model": {"name": "two.obj"},
             "shader": {"vertex": VERT, "fragment": FRAG}},
            {"type": "definition", "name": "bare", "model": {"name": "two.obj"}},
            usage("pair", json!([{"model": [0, 0, 0]}, {"model": [1, 0, 0]}])),
            usage("bare", json!([{"model": [0, 0, 0]}])),
        ]);
        let (gpu, mut ctx) = context();
        let mut scene = Scene::parse(&document, &dir).unwrap();
        scene.allocate_default(&mut ctx).unwrap();
        gpu.clear_calls();

        scene.draw(&mut ctx, &FrameContext::default()).unwrap();

        assert_eq!(scene.definition("pair").unwrap().objects.len(), 2);
        // two meshes times two instances; "bare" has no shader
        assert_eq!(gpu.draw_count(), 4);
        assert_eq!(ctx.shaders.len(), 1);
    }

    #[test]
    fn test_load_allocates_only_with_context() {
        let dir = std::env::temp_dir().join("glscene_scene_load");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("scene.json");
        let document = json!([cube(), usage("box", json!([{"model": [0, 0, 0]}]))]);
        std::fs::write(&path, document.to_string()).unwrap();

        let parsed = Scene::load(&path, None).unwrap();
        assert_eq!(parsed.state(), SceneState::Parsed);
        assert_eq!(parsed.base_dir(), dir.as_path());

        let (_gpu, mut ctx) = context();
        let allocated = Scene::load(&path, Some(&mut ctx)).unwrap();
        assert_eq!(allocated.state(), SceneState::Allocated);

        assert!(matches!(
            Scene::load(dir.join("missing.json"), None),
            Err(Error::ReadFile { .. })
        ));
        std::fs::write(dir.join("broken.json"), "[{").unwrap();
        assert!(matches!(
            Scene::load(dir.join("broken.json"), None),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_apply_uniforms_once_per_program() {
        let (gpu, mut ctx, scene) = allocated(json!([cube(), triangle("tri", &[0, 1, 2])]));

        scene.apply_uniforms(&mut ctx, &[("time".to_string(), UniformValue::Float(1.5))]);

        assert_eq!(gpu.uniform_writes("time"), vec![UniformValue::Float(1.5)]);
    }

    #[test]
    fn test_release_returns_to_parsed() {
        let (gpu, mut ctx, mut scene) =
            allocated(json!([cube(), usage("box", json!([{"model": [0, 0, 0]}]))]));

        scene.release(&mut ctx);

        assert_eq!(scene.state(), SceneState::Parsed);
        assert_eq!(gpu.count(|c| matches!(c, GpuCall::DeleteVertexArray(_))), 1);
        assert!(matches!(
            scene.draw(&mut ctx, &FrameContext::default()),
            Err(Error::NotAllocated)
        ));
    }

    #[test]
    fn test_normal_matrix_undoes_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let normal = normal_matrix(&model);
        assert_eq!(normal.x.x, 0.5);
        assert_eq!(normal_matrix(&Matrix4::from_scale(0.0)), Matrix3::identity());
    }
}
