use std::{
    cell::Cell,
    collections::HashMap,
    io::Cursor,
    path::{Path, PathBuf},
    rc::Rc,
};

use flow_viewer::{
    data_structures::{
        model::ModelVertex,
        scene::{EmbeddedTexture, Face, ImportedScene, Material, Mesh, TextureRef, Vertex},
    },
    gpu::{GpuBackend, GpuError},
    render::DrawCall,
    resources::{ImportError, Importer, texture::ResolvedTexture},
};

/// One mesh, three vertices, one triangle, no UVs or normals.
pub fn triangle_mesh(name: &str) -> Mesh {
    Mesh::new(
        name,
        vec![
            Vertex::new([0.0, 0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0]),
        ],
        vec![Face::triangle(0, 1, 2)],
    )
}

/// A unit quad in the XY plane with UVs and normals, split into two triangles.
pub fn quad_mesh(name: &str) -> Mesh {
    let corners = [
        ([0.0, 0.0, 0.0], [0.0, 1.0]),
        ([1.0, 0.0, 0.0], [1.0, 1.0]),
        ([1.0, 1.0, 0.0], [1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0]),
    ];
    Mesh::new(
        name,
        corners
            .iter()
            .map(|&(p, uv)| Vertex::new(p).with_uv(uv).with_normal([0.0, 0.0, 1.0]))
            .collect(),
        vec![Face::triangle(0, 1, 2), Face::triangle(0, 2, 3)],
    )
}

pub fn scene_of(meshes: Vec<Mesh>) -> ImportedScene {
    ImportedScene {
        meshes,
        ..Default::default()
    }
}

/// A triangle scene carrying one embedded PNG of the given size.
pub fn textured_scene(width: u32, height: u32) -> ImportedScene {
    ImportedScene {
        meshes: vec![triangle_mesh("textured")],
        materials: vec![Material {
            name: "material".to_string(),
            textures: vec![TextureRef::Embedded(0)],
        }],
        textures: vec![EmbeddedTexture::from_parts(
            0,
            0,
            png_bytes(width, height, [200, 40, 40, 255]),
            Some("png"),
        )],
    }
}

/// Encode a solid-colour image as PNG.
pub fn png_bytes(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("failed to encode png fixture");
    bytes.into_inner()
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("flow-viewer-{}-{name}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).expect("failed to clear scratch dir");
    }
    std::fs::create_dir_all(&dir).expect("failed to create scratch dir");
    dir
}

/// Importer serving prepared scenes; unknown paths fail like a corrupt file.
#[derive(Default)]
pub struct StubImporter {
    scenes: HashMap<PathBuf, ImportedScene>,
}

impl StubImporter {
    pub fn with(mut self, path: impl Into<PathBuf>, scene: ImportedScene) -> Self {
        self.scenes.insert(path.into(), scene);
        self
    }
}

impl Importer for StubImporter {
    fn import(&self, path: &Path) -> Result<ImportedScene, ImportError> {
        self.scenes
            .get(path)
            .cloned()
            .ok_or_else(|| ImportError::Parse {
                path: path.to_path_buf(),
                reason: "corrupt file".to_string(),
            })
    }
}

/// Counts a live GPU handle until dropped.
#[derive(Debug)]
struct LiveGuard {
    live: Rc<Cell<usize>>,
}

impl LiveGuard {
    fn new(live: &Rc<Cell<usize>>, peak: &Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        peak.set(peak.get().max(live.get()));
        Self { live: live.clone() }
    }
}

impl Drop for LiveGuard {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

#[derive(Debug)]
pub struct FakeBuffer {
    pub len: usize,
    _guard: LiveGuard,
}

#[derive(Debug)]
pub struct FakeTexture {
    pub size: (u32, u32),
    _guard: LiveGuard,
}

/// What one `draw` call asked for.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawRecord {
    pub clear_colour: wgpu::Color,
    /// `None` for a clear-only frame.
    pub index_count: Option<u32>,
    pub vertex_len: Option<usize>,
    pub texture_size: Option<(u32, u32)>,
    pub has_texture_flag: u32,
}

/// In-memory [`GpuBackend`] counting live handles and recording draws.
#[derive(Default)]
pub struct RecordingBackend {
    live_buffers: Rc<Cell<usize>>,
    peak_buffers: Rc<Cell<usize>>,
    live_textures: Rc<Cell<usize>>,
    peak_textures: Rc<Cell<usize>>,
    pub textures_created: usize,
    pub size: (u32, u32),
    pub draws: Vec<DrawRecord>,
    pub fail_vertex_buffers: bool,
    pub fail_index_buffers: bool,
    pub fail_textures: bool,
    /// Largest texture side `validate_texture` accepts.
    pub max_texture_side: Option<u32>,
}

impl RecordingBackend {
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.get()
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.get()
    }

    pub fn peak_textures(&self) -> usize {
        self.peak_textures.get()
    }

    pub fn last_draw(&self) -> &DrawRecord {
        self.draws.last().expect("nothing was drawn")
    }

    fn buffer(&self, len: usize) -> FakeBuffer {
        FakeBuffer {
            len,
            _guard: LiveGuard::new(&self.live_buffers, &self.peak_buffers),
        }
    }
}

impl GpuBackend for RecordingBackend {
    type Buffer = FakeBuffer;
    type Texture = FakeTexture;

    fn create_vertex_buffer(
        &mut self,
        _label: &str,
        vertices: &[ModelVertex],
    ) -> Result<Self::Buffer, GpuError> {
        if self.fail_vertex_buffers {
            return Err(GpuError::BufferTooLarge {
                size: std::mem::size_of_val(vertices) as u64,
                limit: 0,
            });
        }
        Ok(self.buffer(vertices.len()))
    }

    fn create_index_buffer(
        &mut self,
        _label: &str,
        indices: &[u32],
    ) -> Result<Self::Buffer, GpuError> {
        if self.fail_index_buffers {
            return Err(GpuError::BufferTooLarge {
                size: std::mem::size_of_val(indices) as u64,
                limit: 0,
            });
        }
        Ok(self.buffer(indices.len()))
    }

    fn validate_texture(&self, texture: &ResolvedTexture) -> Result<(), GpuError> {
        let (width, height) = texture.dimensions();
        match self.max_texture_side {
            Some(limit) if width > limit || height > limit => Err(GpuError::TextureTooLarge {
                width,
                height,
                limit,
            }),
            _ => Ok(()),
        }
    }

    fn create_texture(&mut self, texture: &ResolvedTexture) -> Result<Self::Texture, GpuError> {
        let (width, height) = texture.dimensions();
        if self.fail_textures {
            return Err(GpuError::TextureTooLarge {
                width,
                height,
                limit: 0,
            });
        }
        self.textures_created += 1;
        Ok(FakeTexture {
            size: (width, height),
            _guard: LiveGuard::new(&self.live_textures, &self.peak_textures),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.size = (width, height);
        }
    }

    fn draw(&mut self, call: DrawCall<'_, Self>) -> Result<(), GpuError> {
        let record = DrawRecord {
            clear_colour: call.clear_colour,
            index_count: call.model.as_ref().map(|m| m.index_count),
            vertex_len: call.model.as_ref().map(|m| m.vertex.len),
            texture_size: call
                .model
                .as_ref()
                .and_then(|m| m.texture)
                .map(|t| t.size),
            has_texture_flag: call.uniform.has_texture,
        };
        self.draws.push(record);
        Ok(())
    }
}
