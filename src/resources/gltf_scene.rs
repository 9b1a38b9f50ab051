use std::{borrow::Cow, collections::HashMap, path::Path};

use cgmath::Matrix4;
use percent_encoding::percent_decode_str;

use crate::{
    data_structures::scene::{
        EmbeddedTexture, Face, ImportedScene, Material, Mesh, TextureRef, Vertex,
    },
    resources::{ImportError, Importer, mesh::finish_mesh, postprocess},
};

/// glTF 2.0 importer (`.gltf` with external or data-URI buffers, and binary `.glb`).
///
/// The scene graph is flattened: every primitive of every mesh node becomes one
/// [`Mesh`] with the node's world transform baked into its vertices.
#[derive(Clone, Copy, Debug, Default)]
pub struct GltfImporter;

impl Importer for GltfImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError> {
        let parse_err = |e: gltf::Error| match e {
            gltf::Error::Io(source) => ImportError::Io {
                path: path.to_path_buf(),
                source,
            },
            e => ImportError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        };

        let gltf::Gltf { document, blob } = gltf::Gltf::open(path).map_err(parse_err)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(parse_err)?;

        let (textures, image_refs) = load_images(&document, &buffers);
        let materials = document
            .materials()
            .map(|material| {
                let textures = material
                    .pbr_metallic_roughness()
                    .base_color_texture()
                    .and_then(|info| image_refs.get(&info.texture().source().index()).cloned())
                    .into_iter()
                    .collect();
                Material {
                    name: material.name().unwrap_or_default().to_string(),
                    textures,
                }
            })
            .collect();

        let mut meshes = Vec::new();
        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        match scene {
            Some(scene) => {
                for node in scene.nodes() {
                    visit_node(&node, Matrix4::from_scale(1.0), &buffers, &mut meshes);
                }
            }
            None => {
                // no scene graph at all: take the meshes untransformed
                for mesh in document.meshes() {
                    read_mesh(&mesh, &Matrix4::from_scale(1.0), &buffers, &mut meshes);
                }
            }
        }

        if meshes.is_empty() {
            return Err(ImportError::NoMeshes {
                path: path.to_path_buf(),
            });
        }

        Ok(ImportedScene {
            meshes,
            materials,
            textures,
        })
    }
}

/// Collect embedded images and map glTF image indices to texture references.
fn load_images(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> (Vec<EmbeddedTexture>, HashMap<usize, TextureRef>) {
    let mut textures = Vec::new();
    let mut refs = HashMap::new();
    for image in document.images() {
        match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let Some(buffer) = buffers.get(view.buffer().index()) else {
                    log::warn!("Image {} points at a missing buffer", image.index());
                    continue;
                };
                let start = view.offset();
                let end = start + view.length();
                let Some(bytes) = buffer.get(start..end) else {
                    log::warn!("Image {} lies outside of its buffer", image.index());
                    continue;
                };
                refs.insert(image.index(), TextureRef::Embedded(textures.len()));
                textures.push(EmbeddedTexture::from_parts(
                    0,
                    0,
                    bytes.to_vec(),
                    mime_type.split('/').next_back(),
                ));
            }
            gltf::image::Source::Uri { uri, .. } if uri.starts_with("data:") => {
                log::warn!(
                    "Image {} is a data URI; inline images are not supported, skipping",
                    image.index()
                );
            }
            gltf::image::Source::Uri { uri, .. } => {
                refs.insert(image.index(), TextureRef::parse(&decode_uri(uri)));
            }
        }
    }
    (textures, refs)
}

/// Percent-decode a relative image URI; invalid UTF-8 keeps the raw text.
fn decode_uri(uri: &str) -> Cow<'_, str> {
    percent_decode_str(uri)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(uri))
}

fn visit_node(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<Mesh>,
) {
    let world = parent * Matrix4::from(node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        read_mesh(&mesh, &world, buffers, meshes);
    }
    for child in node.children() {
        visit_node(&child, world, buffers, meshes);
    }
}

fn read_mesh(
    mesh: &gltf::Mesh,
    transform: &Matrix4<f32>,
    buffers: &[gltf::buffer::Data],
    meshes: &mut Vec<Mesh>,
) {
    let mesh_name = mesh.name().unwrap_or("mesh");
    for primitive in mesh.primitives() {
        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d[..]));

        let mut vertices: Vec<Vertex> = match reader.read_positions() {
            Some(positions) => positions.map(Vertex::new).collect(),
            None => {
                log::warn!(
                    "Primitive {} of mesh '{mesh_name}' has no positions, skipping",
                    primitive.index()
                );
                continue;
            }
        };
        if let Some(normals) = reader.read_normals() {
            vertices
                .iter_mut()
                .zip(normals)
                .for_each(|(v, n)| v.normal = Some(n));
        }
        if let Some(uvs) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
            vertices
                .iter_mut()
                .zip(uvs)
                .for_each(|(v, uv)| v.uv = Some(uv));
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..vertices.len() as u32).collect(),
        };
        let faces = faces_for_mode(primitive.mode(), &indices);

        let mut out = Mesh::new(
            format!("{mesh_name}.{}", primitive.index()),
            vertices,
            faces,
        );
        postprocess::bake_transform(&mut out, transform);
        finish_mesh(&mut out);
        meshes.push(out);
    }
}

fn faces_for_mode(mode: gltf::mesh::Mode, indices: &[u32]) -> Vec<Face> {
    use gltf::mesh::Mode;
    match mode {
        Mode::Triangles => indices.chunks(3).map(|c| Face::from(c.to_vec())).collect(),
        Mode::TriangleStrip => postprocess::strip_to_triangles(indices),
        Mode::TriangleFan => postprocess::fan_to_triangles(indices),
        Mode::Points => indices.iter().map(|&i| Face::from(vec![i])).collect(),
        Mode::Lines => indices.chunks(2).map(|c| Face::from(c.to_vec())).collect(),
        Mode::LineStrip | Mode::LineLoop => indices
            .windows(2)
            .map(|w| Face::from(w.to_vec()))
            .collect(),
    }
}
