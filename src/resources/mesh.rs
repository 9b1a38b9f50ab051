use std::path::Path;

use crate::{
    data_structures::scene::{Face, ImportedScene, Material, Mesh, TextureRef, Vertex},
    resources::{ImportError, Importer, postprocess},
};

/// Wavefront OBJ importer backed by `tobj`.
///
/// tobj triangulates polygons and merges the separate position/uv/normal index
/// streams into a single index (`single_index`). Materials come from the
/// `mtllib` files next to the model; a missing or broken MTL only costs the
/// textures, never the geometry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ObjImporter;

impl Importer for ObjImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError> {
        if !path.is_file() {
            return Err(ImportError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }

        let (models, obj_materials) = tobj::load_obj(
            path,
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
        )
        .map_err(|e| ImportError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let materials = match obj_materials {
            Ok(materials) => materials.into_iter().map(to_material).collect(),
            Err(e) => {
                log::warn!(
                    "Materials of {} could not be loaded ({e}); continuing without textures.",
                    path.display()
                );
                Vec::new()
            }
        };

        let meshes: Vec<Mesh> = models.into_iter().map(to_mesh).collect();
        if meshes.is_empty() {
            return Err(ImportError::NoMeshes {
                path: path.to_path_buf(),
            });
        }

        Ok(ImportedScene {
            meshes,
            materials,
            textures: Vec::new(),
        })
    }
}

fn to_mesh(model: tobj::Model) -> Mesh {
    let m = &model.mesh;
    let vertices = (0..m.positions.len() / 3)
        .map(|i| Vertex {
            position: [
                m.positions[i * 3],
                m.positions[i * 3 + 1],
                m.positions[i * 3 + 2],
            ],
            // OBJ puts the texture origin bottom-left, wgpu samples top-left
            uv: match (m.texcoords.get(i * 2), m.texcoords.get(i * 2 + 1)) {
                (Some(&u), Some(&v)) => Some([u, 1.0 - v]),
                _ => None,
            },
            normal: match (
                m.normals.get(i * 3),
                m.normals.get(i * 3 + 1),
                m.normals.get(i * 3 + 2),
            ) {
                (Some(&x), Some(&y), Some(&z)) => Some([x, y, z]),
                _ => None,
            },
        })
        .collect();

    let faces = m
        .indices
        .chunks(3)
        .map(|c| Face::from(c.to_vec()))
        .collect();

    let mut mesh = Mesh::new(model.name, vertices, faces);
    finish_mesh(&mut mesh);
    mesh
}

/// Generate missing normals, then weld.
pub(crate) fn finish_mesh(mesh: &mut Mesh) {
    if !mesh.has_normals() {
        postprocess::generate_smooth_normals(mesh);
    }
    let removed = postprocess::weld_vertices(mesh);
    if removed > 0 {
        log::debug!("Welded {removed} duplicate vertices in mesh '{}'", mesh.name);
    }
}

fn to_material(m: tobj::Material) -> Material {
    let textures = [m.diffuse_texture.as_deref(), m.ambient_texture.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|tex| !tex.is_empty())
        // MTL files written on Windows use backslashes
        .map(|tex| TextureRef::parse(&tex.replace('\\', "/")))
        .collect();
    Material {
        name: m.name,
        textures,
    }
}
