//! # Model Importer
//!
//! Turns a Wavefront OBJ file into one [`PlainModel`] per mesh, in file
//! order. Geometry is interleaved as position/normal/uv; normals are rebuilt
//! from faces when the file has none and missing UVs are zero.
//!
//! Material textures are returned as file sources named `diffuseTexture_N`
//! and `specularTexture_N`; decoding happens when the object is allocated.

use std::collections::BTreeMap;
use std::path::Path;

use cgmath::{InnerSpace, Vector3};

use crate::error::{Error, Result};
use crate::gfx::resources::TextureSource;

/// Interleaved vertex as uploaded for imported meshes.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl ModelVertex {
    /// Components per attribute, matching the field order above.
    pub const LAYOUT: [u32; 3] = [3, 3, 2];
}

/// One imported mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlainModel {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub textures: BTreeMap<String, TextureSource>,
}

impl PlainModel {
    /// Vertex data flattened to floats in [`ModelVertex::LAYOUT`] order.
    pub fn raw_vertices(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }
}

pub fn import_model(path: impl AsRef<Path>) -> Result<Vec<PlainModel>> {
    let path = path.as_ref();
    let (models, materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .map_err(|e| Error::ModelLoadError(format!("{}: {e}", path.display())))?;

    let materials = materials.unwrap_or_else(|e| {
        log::warn!("no materials for {}: {e}", path.display());
        Vec::new()
    });
    let directory = path.parent().unwrap_or_else(|| Path::new(""));

    let mut imported = Vec::with_capacity(models.len());
    for model in &models {
        let mesh = &model.mesh;
        if mesh.positions.is_empty() {
            continue;
        }

        let normals = if mesh.normals.len() == mesh.positions.len() {
            mesh.normals.clone()
        } else {
            face_normals(&mesh.positions, &mesh.indices)
        };
        let vertex_count = mesh.positions.len() / 3;
        let has_uv = mesh.texcoords.len() == vertex_count * 2;

        let vertices = (0..vertex_count)
            .map(|i| ModelVertex {
                position: [
                    mesh.positions[i * 3],
                    mesh.positions[i * 3 + 1],
                    mesh.positions[i * 3 + 2],
                ],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
                uv: if has_uv {
                    [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
                } else {
                    [0.0, 0.0]
                },
            })
            .collect();

        let mut textures = BTreeMap::new();
        if let Some(material) = mesh.material_id.and_then(|id| materials.get(id)) {
            let maps = [
                ("diffuseTexture", &material.diffuse_texture),
                ("specularTexture", &material.specular_texture),
            ];
            for (prefix, file) in maps {
                if let Some(file) = file {
                    textures.insert(
                        format!("{prefix}_0"),
                        TextureSource::File(directory.join(file)),
                    );
                }
            }
        }

        imported.push(PlainModel {
            vertices,
            indices: mesh.indices.clone(),
            textures,
        });
    }

    log::info!("imported {} mesh(es) from {}", imported.len(), path.display());
    Ok(imported)
}

/// Per-vertex normals averaged from the faces that share each vertex.
pub fn face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
    let position = |i: usize| Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]);
    let mut sums = vec![Vector3::new(0.0f32, 0.0, 0.0); positions.len() / 3];

    for face in indices.chunks_exact(3) {
        let [a, b, c] = [face[0] as usize, face[1] as usize, face[2] as usize];
        if a >= sums.len() || b >= sums.len() || c >= sums.len() {
            continue;
        }
        let normal = (position(b) - position(a)).cross(position(c) - position(a));
        sums[a] += normal;
        sums[b] += normal;
        sums[c] += normal;
    }

    sums.into_iter()
        .flat_map(|sum| {
            let n = if sum.magnitude2() > 0.0 { sum.normalize() } else { sum };
            [n.x, n.y, n.z]
        })
        .collect()
}
