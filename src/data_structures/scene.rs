//! Imported scene description.
//!
//! An [`ImportedScene`] is the flat, format-agnostic output of an importer: every
//! mesh is already triangulated (where the source allowed it) and expressed in a
//! single coordinate space. The scene is produced once per load call and consumed
//! by [`crate::processor::process`]; nothing keeps it around afterwards.

use std::path::PathBuf;

/// A single vertex as delivered by the importer.
///
/// UVs and normals are optional because not every source format (or every mesh in
/// a file) provides them. Defaults are applied later when interleaving.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: Option<[f32; 2]>,
    pub normal: Option<[f32; 3]>,
}

impl Vertex {
    pub fn new(position: [f32; 3]) -> Self {
        Self {
            position,
            uv: None,
            normal: None,
        }
    }

    pub fn with_uv(mut self, uv: [f32; 2]) -> Self {
        self.uv = Some(uv);
        self
    }

    pub fn with_normal(mut self, normal: [f32; 3]) -> Self {
        self.normal = Some(normal);
        self
    }
}

/// A polygon referencing vertices of the owning mesh.
///
/// Importers triangulate whatever they can, so almost every face has three
/// indices. Points and lines survive as one- and two-index faces and are
/// dropped by the processor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Face {
    pub indices: Vec<u32>,
}

impl Face {
    pub fn triangle(a: u32, b: u32, c: u32) -> Self {
        Self {
            indices: vec![a, b, c],
        }
    }

    pub fn is_triangle(&self) -> bool {
        self.indices.len() == 3
    }
}

impl From<Vec<u32>> for Face {
    fn from(indices: Vec<u32>) -> Self {
        Self { indices }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
}

impl Mesh {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        Self {
            name: name.into(),
            vertices,
            faces,
        }
    }

    pub fn has_normals(&self) -> bool {
        !self.vertices.is_empty() && self.vertices.iter().all(|v| v.normal.is_some())
    }
}

/// Reference from a material to a texture image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureRef {
    /// Index into [`ImportedScene::textures`].
    Embedded(usize),
    /// Path as written in the model file, relative to the model's directory
    /// unless absolute.
    External(PathBuf),
}

impl TextureRef {
    /// Prefix marking an embedded texture index inside a texture path string (`*0`, `*1`, ...).
    pub const EMBEDDED_SENTINEL: char = '*';

    /// Interpret a texture path string from a model file.
    ///
    /// `*N` names the N-th embedded texture; everything else is a file path.
    pub fn parse(raw: &str) -> Self {
        raw.strip_prefix(Self::EMBEDDED_SENTINEL)
            .and_then(|idx| idx.parse::<usize>().ok())
            .map(TextureRef::Embedded)
            .unwrap_or_else(|| TextureRef::External(PathBuf::from(raw)))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Material {
    pub name: String,
    /// Texture references in the order they should be tried.
    pub textures: Vec<TextureRef>,
}

/// Image data stored inside the model file.
#[derive(Clone, Debug, PartialEq)]
pub enum EmbeddedTexture {
    /// An encoded image file (png, jpeg, ...) kept as-is.
    Compressed {
        data: Vec<u8>,
        format_hint: Option<String>,
    },
    /// Uncompressed RGBA8 pixels.
    Raw {
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    },
}

impl EmbeddedTexture {
    /// Build an embedded texture from the classic importer encoding: a height of
    /// zero marks `data` as a compressed blob, anything else as `width * height`
    /// RGBA pixels.
    pub fn from_parts(width: u32, height: u32, data: Vec<u8>, format_hint: Option<&str>) -> Self {
        if height == 0 {
            EmbeddedTexture::Compressed {
                data,
                format_hint: format_hint
                    .map(|hint| hint.trim_start_matches('.').to_ascii_lowercase())
                    .filter(|hint| !hint.is_empty()),
            }
        } else {
            EmbeddedTexture::Raw {
                width,
                height,
                rgba: data,
            }
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, EmbeddedTexture::Compressed { .. })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedScene {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub textures: Vec<EmbeddedTexture>,
}

impl ImportedScene {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_ref_sentinel() {
        assert_eq!(TextureRef::parse("*2"), TextureRef::Embedded(2));
        assert_eq!(
            TextureRef::parse("textures/wood.png"),
            TextureRef::External(PathBuf::from("textures/wood.png"))
        );
        // not a number after the sentinel: treat it as a file name
        assert_eq!(
            TextureRef::parse("*wood.png"),
            TextureRef::External(PathBuf::from("*wood.png"))
        );
    }

    #[test]
    fn height_zero_means_compressed() {
        let tex = EmbeddedTexture::from_parts(1234, 0, vec![1, 2, 3], Some(".PNG"));
        assert_eq!(
            tex,
            EmbeddedTexture::Compressed {
                data: vec![1, 2, 3],
                format_hint: Some("png".to_string()),
            }
        );
        let raw = EmbeddedTexture::from_parts(1, 1, vec![0, 0, 0, 255], None);
        assert!(!raw.is_compressed());
    }
}
