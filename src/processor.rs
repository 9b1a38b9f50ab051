//! Scene processing: merge, bound and texture an imported scene.
//!
//! [`process`] is the pure middle of the load pipeline. It takes ownership of an
//! [`ImportedScene`], interleaves all meshes into one vertex/index buffer pair,
//! measures the bounding box and resolves the texture. No GPU involvement.

use std::path::Path;

use thiserror::Error;

use crate::{
    data_structures::{
        bounds::BoundingBox,
        model::{ModelVertex, ProcessedGeometry},
        scene::{ImportedScene, Mesh},
    },
    resources::texture::{ResolvedTexture, resolve_texture},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    #[error("the model has no usable triangles")]
    EmptyGeometry,
}

/// Everything the render engine needs from one load.
#[derive(Clone, Debug)]
pub struct ProcessedScene {
    pub geometry: ProcessedGeometry,
    pub bounds: BoundingBox,
    pub texture: Option<ResolvedTexture>,
}

/// Process `scene`; external texture paths are resolved against `model_dir`.
pub fn process(scene: ImportedScene, model_dir: &Path) -> Result<ProcessedScene, ProcessError> {
    let geometry = merge_meshes(&scene.meshes);
    if geometry.is_empty() {
        return Err(ProcessError::EmptyGeometry);
    }
    let bounds = BoundingBox::from_points(geometry.vertices.iter().map(|v| v.position))
        .ok_or(ProcessError::EmptyGeometry)?;
    let texture = resolve_texture(&scene, model_dir);

    Ok(ProcessedScene {
        geometry,
        bounds,
        texture,
    })
}

/// Interleave all meshes in source order.
///
/// Each mesh's indices are shifted by the number of vertices emitted before it.
/// Empty meshes are skipped; faces that are not triangles, or that reference a
/// vertex outside their mesh, are dropped individually.
pub fn merge_meshes(meshes: &[Mesh]) -> ProcessedGeometry {
    let mut geometry = ProcessedGeometry {
        vertices: Vec::with_capacity(meshes.iter().map(|m| m.vertices.len()).sum()),
        indices: Vec::with_capacity(meshes.iter().map(|m| m.faces.len() * 3).sum()),
    };

    for mesh in meshes {
        if mesh.vertices.is_empty() {
            log::debug!("Skipping mesh '{}' without vertices", mesh.name);
            continue;
        }
        let offset = geometry.vertices.len() as u32;
        let vertex_count = mesh.vertices.len() as u32;

        geometry
            .vertices
            .extend(mesh.vertices.iter().map(|v| ModelVertex {
                position: v.position,
                tex_coords: v.uv.unwrap_or(ModelVertex::DEFAULT_TEX_COORDS),
                normal: v.normal.unwrap_or(ModelVertex::DEFAULT_NORMAL),
            }));

        let mut skipped = 0usize;
        for face in &mesh.faces {
            if !face.is_triangle() || face.indices.iter().any(|&i| i >= vertex_count) {
                skipped += 1;
                continue;
            }
            geometry
                .indices
                .extend(face.indices.iter().map(|&i| i + offset));
        }
        if skipped > 0 {
            log::warn!(
                "Skipped {skipped} non-triangular or malformed faces in mesh '{}'",
                mesh.name
            );
        }
    }

    geometry
}
