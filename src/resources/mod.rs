use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::data_structures::scene::ImportedScene;

/**
 * This module contains all logic for loading meshes/materials/textures from model files.
 *
 * Format adapters implement [`Importer`]; [`SceneImporter`] picks one by file extension.
 * Every adapter triangulates, generates missing normals, welds duplicate vertices and
 * bakes node transforms so downstream code can treat the scene as flat.
 */
pub mod gltf_scene;
pub mod mesh;
pub mod postprocess;
pub mod texture;

pub use gltf_scene::GltfImporter;
pub use mesh::ObjImporter;

/// Why a model file could not be turned into an [`ImportedScene`].
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported model format '{extension}' ({})", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },
    #[error("failed to parse {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("{} contains no meshes", .path.display())]
    NoMeshes { path: PathBuf },
}

/// Turns a model file into a flat scene description.
///
/// Implementations only read the file (and files it references); they never
/// touch GPU state. Test code substitutes synthetic importers here.
pub trait Importer {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError>;
}

impl<T: Importer + ?Sized> Importer for Box<T> {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError> {
        (**self).import(path)
    }
}

/// Default importer: dispatches on the file extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct SceneImporter {
    obj: ObjImporter,
    gltf: GltfImporter,
}

impl SceneImporter {
    /// Extensions (lower case) this importer understands.
    pub const SUPPORTED_EXTENSIONS: &'static [&'static str] = &["obj", "gltf", "glb"];

    pub fn supports(path: &Path) -> bool {
        extension_of(path)
            .map(|ext| Self::SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

impl Importer for SceneImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError> {
        let scene = match extension_of(path).as_deref() {
            Some("obj") => self.obj.import(path)?,
            Some("gltf" | "glb") => self.gltf.import(path)?,
            other => {
                return Err(ImportError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension: other.unwrap_or_default().to_string(),
                });
            }
        };
        log::debug!(
            "Imported {}: {} meshes ({} vertices), {} materials, {} embedded textures",
            path.display(),
            scene.meshes.len(),
            scene.vertex_count(),
            scene.materials.len(),
            scene.textures.len()
        );
        Ok(scene)
    }
}
