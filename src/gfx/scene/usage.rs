//! # Usages
//!
//! Per-instance placement, material and light data parsed from `usage`
//! entries, plus the per-frame transform hooks that can be attached to an
//! instance after loading.

use std::fmt;

use cgmath::{Deg, InnerSpace, Matrix4, SquareMatrix, Vector3, Vector4};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

use super::json::{field, number, string, vec3};

/// Per-frame state handed to the draw pass and to transform hooks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub view_pos: Vector3<f32>,
    pub view_facing: Vector3<f32>,
    /// Seconds since the loop started.
    pub time: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
}

impl Default for FrameContext {
    fn default() -> Self {
        Self {
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
            view_pos: Vector3::new(0.0, 0.0, 0.0),
            view_facing: Vector3::new(0.0, 0.0, -1.0),
            time: 0.0,
            delta: 0.0,
        }
    }
}

/// Extra model-matrix factor computed each frame, applied after the
/// instance's own translation and rotation.
pub trait InstanceTransform {
    fn transform(&self, frame: &FrameContext) -> Matrix4<f32>;
}

impl<F> InstanceTransform for F
where
    F: Fn(&FrameContext) -> Matrix4<f32>,
{
    fn transform(&self, frame: &FrameContext) -> Matrix4<f32> {
        self(frame)
    }
}

/// Circles the XY plane around the instance origin at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Orbit {
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    #[serde(default = "one")]
    pub speed: f32,
}

fn one() -> f32 {
    1.0
}

impl InstanceTransform for Orbit {
    fn transform(&self, frame: &FrameContext) -> Matrix4<f32> {
        let angle = frame.time * self.speed;
        Matrix4::from_translation(Vector3::new(
            angle.cos() * self.radius,
            angle.sin() * self.radius,
            self.height,
        ))
    }
}

/// Constant rotation about an axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Spin {
    pub axis: [f32; 3],
    pub degrees_per_second: f32,
}

impl InstanceTransform for Spin {
    fn transform(&self, frame: &FrameContext) -> Matrix4<f32> {
        rotation(self.axis.into(), frame.time * self.degrees_per_second)
    }
}

/// Rotation by `degrees` about `axis`; identity for a zero axis.
pub fn rotation(axis: Vector3<f32>, degrees: f32) -> Matrix4<f32> {
    if axis.magnitude2() == 0.0 {
        Matrix4::identity()
    } else {
        Matrix4::from_axis_angle(axis.normalize(), Deg(degrees))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [1.0; 3],
            diffuse: [1.0; 3],
            specular: [1.0; 3],
            shininess: 32.0,
        }
    }
}

/// One placed copy of a definition.
pub struct InstanceDescriptor {
    pub translation: Vector3<f32>,
    pub axis: Vector3<f32>,
    pub degree: f32,
    pub material: Material,
    /// Flat colour; replaces the material uniforms when set.
    pub color: Option<[f32; 3]>,
    transform: Option<Box<dyn InstanceTransform>>,
}

impl fmt::Debug for InstanceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceDescriptor")
            .field("translation", &self.translation)
            .field("axis", &self.axis)
            .field("degree", &self.degree)
            .field("material", &self.material)
            .field("color", &self.color)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

impl InstanceDescriptor {
    pub fn new(translation: [f32; 3]) -> Self {
        Self {
            translation: translation.into(),
            axis: Vector3::new(0.0, 0.0, 0.0),
            degree: 0.0,
            material: Material::default(),
            color: None,
            transform: None,
        }
    }

    pub fn set_transform(&mut self, transform: impl InstanceTransform + 'static) {
        self.transform = Some(Box::new(transform));
    }

    pub fn clear_transform(&mut self) {
        self.transform = None;
    }

    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// `T(translation) * R(degree, axis) * hook(frame)`.
    pub fn model_matrix(&self, frame: &FrameContext) -> Matrix4<f32> {
        let base = Matrix4::from_translation(self.translation) * rotation(self.axis, self.degree);
        match &self.transform {
            Some(hook) => base * hook.transform(frame),
            None => base,
        }
    }

    /// World position of the instance origin this frame.
    pub fn world_position(&self, frame: &FrameContext) -> Vector3<f32> {
        (self.model_matrix(frame) * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate()
    }
}

/// All instances placed under one name, in file order.
#[derive(Debug, Default)]
pub struct ObjectUsage {
    pub instances: Vec<InstanceDescriptor>,
}

impl ObjectUsage {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instance_mut(&mut self, index: usize) -> Option<&mut InstanceDescriptor> {
        self.instances.get_mut(index)
    }
}

/// Identifies a light by the usage instance that declared it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightKey {
    pub definition: String,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightSource {
    /// Uniform struct name the shaders read this light from.
    pub name: String,
    pub position: [f32; 3],
    pub color: [f32; 3],
    pub strength: [f32; 3],
    pub attenuation: [f32; 3],
    pub direction: [f32; 3],
    /// Cosine of the inner spot angle.
    pub cutoff: f32,
    /// Cosine of the outer spot angle.
    pub outer_cutoff: f32,
}

fn spot_cosine(degrees: f32) -> f32 {
    degrees.to_radians().cos()
}

/// `strength` is a 3-vector or a scalar applied to all channels.
fn strength(value: &Value) -> Result<[f32; 3]> {
    if let Some(scalar) = value.as_f64() {
        return Ok([scalar as f32; 3]);
    }
    vec3(value, "light.strength", Error::MalformedUsage)
}

/// Parses one `attribute` element of the usage `definition`. Returns the
/// instance and, when the light block names a full light, its source.
pub fn resolve_attribute(
    value: &Value,
    definition: &str,
    index: usize,
) -> Result<(InstanceDescriptor, Option<(LightKey, LightSource)>)> {
    let err = Error::MalformedUsage;
    if !value.is_object() {
        return Err(err(format!("{definition}[{index}] must be an object")));
    }

    let model = vec3(field(value, "model", err)?, "model", err)?;
    let mut instance = InstanceDescriptor::new(model);

    if let Some(rotate) = value.get("rotate") {
        instance.axis = vec3(field(rotate, "axis", err)?, "rotate.axis", err)?.into();
        instance.degree = number(field(rotate, "degree", err)?, "rotate.degree", err)?;
    }

    let Some(light) = value.get("light") else {
        return Ok((instance, None));
    };

    if let Some(material) = light.get("material") {
        let defaults = Material::default();
        let channel = |key: &str, default: [f32; 3]| match material.get(key) {
            Some(v) => vec3(v, key, err),
            None => Ok(default),
        };
        instance.material = Material {
            ambient: channel("ambient", defaults.ambient)?,
            diffuse: channel("diffuse", defaults.diffuse)?,
            specular: channel("specular", defaults.specular)?,
            shininess: match material.get("shininess") {
                Some(v) => number(v, "material.shininess", err)?,
                None => defaults.shininess,
            },
        };
    }

    let color = light
        .get("color")
        .map(|v| vec3(v, "light.color", err))
        .transpose()?;
    instance.color = color;

    let (Some(source), Some(color), Some(attenuation), Some(strength_value)) = (
        light.get("source"),
        color,
        light.get("attenuation"),
        light.get("strength"),
    ) else {
        return Ok((instance, None));
    };

    let mut source = LightSource {
        name: string(source, "light.source", err)?.to_string(),
        position: model,
        color,
        strength: strength(strength_value)?,
        attenuation: vec3(attenuation, "light.attenuation", err)?,
        direction: [0.0; 3],
        cutoff: 0.0,
        outer_cutoff: 0.0,
    };
    if let Some(direction) = light.get("direction") {
        source.direction = vec3(direction, "light.direction", err)?;
    }
    if let Some(cutoff) = light.get("cutoff") {
        source.cutoff = spot_cosine(number(cutoff, "light.cutoff", err)?);
    }
    if let Some(outer) = light.get("outerCutoff") {
        source.outer_cutoff = spot_cosine(number(outer, "light.outerCutoff", err)?);
    }

    let key = LightKey {
        definition: definition.to_string(),
        index,
    };
    Ok((instance, Some((key, source))))
}

/// Parses the `attribute` array of a usage entry.
pub fn resolve_attributes(
    value: &Value,
    definition: &str,
    first_index: usize,
) -> Result<Vec<(InstanceDescriptor, Option<(LightKey, LightSource)>)>> {
    let attributes = value
        .get("attribute")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::MalformedUsage(format!("{definition}: attribute must be an array")))?;
    attributes
        .iter()
        .enumerate()
        .map(|(i, attribute)| resolve_attribute(attribute, definition, first_index + i))
        .collect()
}
