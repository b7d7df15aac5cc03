//! Application configuration.
//!
//! Read from an optional JSON file; every field has a default, so a config
//! file only needs the keys it changes:
//!
//! ```json
//! {
//!   "title": "lamp test",
//!   "background": [0.0, 0.0, 0.0, 1.0],
//!   "uniforms": { "ambientStrength": [0.1] },
//!   "animations": [
//!     { "usage": "light", "index": 0, "motion": { "orbit": { "radius": 5.0, "height": 2.0 } } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gfx::camera::CameraSettings;
use crate::gfx::scene::{Orbit, Scene, Spin};
use crate::gl_utils::{Capability, UniformValue};

/// Fixed-function state applied at the start of every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderState {
    pub depth_test: bool,
    pub stencil_test: bool,
    pub blend: bool,
    pub cull_face: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            depth_test: true,
            stencil_test: false,
            blend: false,
            cull_face: false,
        }
    }
}

impl RenderState {
    pub fn capabilities(&self) -> [(Capability, bool); 4] {
        [
            (Capability::DepthTest, self.depth_test),
            (Capability::StencilTest, self.stencil_test),
            (Capability::Blend, self.blend),
            (Capability::CullFace, self.cull_face),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Orbit(Orbit),
    Spin(Spin),
}

/// A built-in transform hook attached to one usage instance at start-up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Animation {
    pub usage: String,
    #[serde(default)]
    pub index: usize,
    pub motion: Motion,
}

impl Animation {
    /// Returns false when the scene has no such instance.
    pub fn attach(&self, scene: &mut Scene) -> bool {
        let Some(instance) = scene.instance_mut(&self.usage, self.index) else {
            log::warn!(
                "animation target {}[{}] does not exist",
                self.usage,
                self.index
            );
            return false;
        };
        match self.motion {
            Motion::Orbit(orbit) => instance.set_transform(orbit),
            Motion::Spin(spin) => instance.set_transform(spin),
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Scene file; paths inside it resolve against its directory.
    pub scene: PathBuf,
    pub background: [f32; 4],
    pub render_state: RenderState,
    pub camera: CameraSettings,
    /// Pushed to every scene program each frame.
    pub uniforms: BTreeMap<String, Vec<f32>>,
    pub animations: Vec<Animation>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "glscene".to_string(),
            width: 1280,
            height: 720,
            scene: PathBuf::from("assets/scene.json"),
            background: [0.2, 0.3, 0.3, 1.0],
            render_state: RenderState::default(),
            camera: CameraSettings::default(),
            uniforms: BTreeMap::new(),
            animations: vec![Animation {
                usage: "light".to_string(),
                index: 0,
                motion: Motion::Orbit(Orbit {
                    radius: 5.0,
                    height: 2.0,
                    speed: 1.0,
                }),
            }],
        }
    }
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The `uniforms` table as typed values.
    pub fn global_uniforms(&self) -> Result<Vec<(String, UniformValue)>> {
        self.uniforms
            .iter()
            .map(|(name, values)| Ok((name.clone(), UniformValue::from_floats(values)?)))
            .collect()
    }

    /// Attaches every configured animation; returns how many found a target.
    pub fn attach_animations(&self, scene: &mut Scene) -> usize {
        self.animations
            .iter()
            .filter(|animation| animation.attach(scene))
            .count()
    }
}
