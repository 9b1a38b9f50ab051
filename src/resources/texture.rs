//! Texture resolution: pick the one image the model is drawn with.
//!
//! Candidates are tried in a fixed order and the first one that decodes wins:
//! every embedded texture in scene order, then every texture reference of every
//! material in scene order. Failures are logged and skipped; running out of
//! candidates simply means the model is drawn untextured.

use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use thiserror::Error;

use crate::data_structures::scene::{EmbeddedTexture, ImportedScene, TextureRef};

/// Why a single texture candidate could not be used. Never fatal for a load.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("raw texture is {len} bytes, expected {width}x{height} RGBA pixels")]
    RawSizeMismatch { width: u32, height: u32, len: usize },
    #[error("embedded texture {0} does not exist")]
    MissingEmbedded(usize),
    #[error("image is {width}x{height}, nothing to sample")]
    Empty { width: u32, height: u32 },
}

/// Where the resolved texture came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureOrigin {
    /// An embedded texture picked up directly (step 1) or through a material's
    /// `*N` reference (step 2).
    Embedded(usize),
    /// A file on disk referenced by a material.
    External(PathBuf),
}

/// A decoded RGBA8 image ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTexture {
    pub image: RgbaImage,
    pub origin: TextureOrigin,
}

impl ResolvedTexture {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Evaluate `candidates` lazily and return the first success.
///
/// Errors are handed to `on_error` as they occur; once a candidate succeeds the
/// remaining ones are never evaluated.
pub fn first_success<T, E, I, F>(candidates: I, mut on_error: F) -> Option<T>
where
    I: IntoIterator<Item = Result<T, E>>,
    F: FnMut(E),
{
    candidates.into_iter().find_map(|candidate| match candidate {
        Ok(value) => Some(value),
        Err(e) => {
            on_error(e);
            None
        }
    })
}

fn non_empty(image: RgbaImage) -> Result<RgbaImage, TextureError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty { width, height });
    }
    Ok(image)
}

/// Decode an embedded texture into RGBA8. Zero-area images are rejected.
pub fn decode_embedded(texture: &EmbeddedTexture) -> Result<RgbaImage, TextureError> {
    let decoded = match texture {
        EmbeddedTexture::Compressed { data, format_hint } => {
            let format = format_hint.as_deref().and_then(ImageFormat::from_extension);
            let img = match format {
                Some(format) => image::load_from_memory_with_format(data, format)
                    // wrong hint: fall back to sniffing the content
                    .or_else(|_| image::load_from_memory(data))?,
                None => image::load_from_memory(data)?,
            };
            img.to_rgba8()
        }
        EmbeddedTexture::Raw {
            width,
            height,
            rgba,
        } => RgbaImage::from_raw(*width, *height, rgba.clone()).ok_or(
            TextureError::RawSizeMismatch {
                width: *width,
                height: *height,
                len: rgba.len(),
            },
        )?,
    };
    non_empty(decoded)
}

/// Read a whole file from disk.
pub fn load_binary(path: &Path) -> Result<Vec<u8>, TextureError> {
    std::fs::read(path).map_err(|source| TextureError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and decode an image file referenced by a material.
///
/// Relative paths are resolved against `model_dir`.
pub fn load_external(model_dir: &Path, path: &Path) -> Result<(RgbaImage, PathBuf), TextureError> {
    let full = model_dir.join(path);
    let data = load_binary(&full)?;
    let format = full
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension);
    let img = match format {
        Some(format) => image::load_from_memory_with_format(&data, format)
            .or_else(|_| image::load_from_memory(&data))?,
        None => image::load_from_memory(&data)?,
    };
    Ok((non_empty(img.to_rgba8())?, full))
}

fn embedded(scene: &ImportedScene, index: usize) -> Result<ResolvedTexture, TextureError> {
    let texture = scene
        .textures
        .get(index)
        .ok_or(TextureError::MissingEmbedded(index))?;
    let image = decode_embedded(texture)?;
    Ok(ResolvedTexture {
        image,
        origin: TextureOrigin::Embedded(index),
    })
}

/// Resolve the texture the model is drawn with, or `None` when nothing decodes.
pub fn resolve_texture(scene: &ImportedScene, model_dir: &Path) -> Option<ResolvedTexture> {
    let from_embedded = (0..scene.textures.len()).map(|index| embedded(scene, index));
    let from_materials = scene
        .materials
        .iter()
        .flat_map(|material| material.textures.iter())
        .map(|reference| match reference {
            TextureRef::Embedded(index) => embedded(scene, *index),
            TextureRef::External(path) => {
                load_external(model_dir, path).map(|(image, full)| ResolvedTexture {
                    image,
                    origin: TextureOrigin::External(full),
                })
            }
        });

    let resolved = first_success(from_embedded.chain(from_materials), |e| {
        log::warn!("Skipping texture candidate: {e}");
    });
    match &resolved {
        Some(texture) => {
            let (w, h) = texture.dimensions();
            log::debug!("Resolved {w}x{h} texture from {:?}", texture.origin);
        }
        None => log::debug!("No usable texture, drawing untextured"),
    }
    resolved
}
