//! The render engine: owns the loaded model's GPU resources and the camera.
//!
//! A [`Viewer`] is either [`ViewerState::Empty`] or [`ViewerState::Ready`].
//! [`Viewer::load`] runs import, processing and upload synchronously and only
//! replaces the current model once the new geometry is on the GPU; any failure
//! before that point leaves the previous model and camera untouched.
//!
//! ```text
//! path -> Importer -> ImportedScene -> process() -> ProcessedScene -> GpuBackend
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{
    camera::{CameraState, CameraUniform, Projection},
    config::ViewerConfig,
    data_structures::bounds::BoundingBox,
    gpu::{GpuBackend, GpuError},
    processor::{self, ProcessError, ProcessedScene},
    render::{DrawCall, ModelDraw},
    resources::{ImportError, Importer, SceneImporter, texture::TextureOrigin},
};

/// Why a [`Viewer::load`] call failed. The `Display` text is meant for the user.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("{} contains no usable geometry", .path.display())]
    EmptyGeometry { path: PathBuf },
    #[error("failed to upload {} to the GPU: {source}", .path.display())]
    GpuUpload {
        path: PathBuf,
        #[source]
        source: GpuError,
    },
}

/// Notifications for the shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewerEvent {
    ModelLoaded { name: String, path: PathBuf },
    LoadFailed { path: PathBuf, message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewerState {
    /// Nothing loaded; drawing only clears the target.
    Empty,
    /// A model is on the GPU and camera input is active.
    Ready,
}

/// Summary of the loaded model.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelStats {
    pub name: String,
    pub vertex_count: usize,
    pub triangle_count: usize,
    /// Size of the uploaded texture, if the model is drawn textured.
    pub texture_size: Option<(u32, u32)>,
    pub texture_origin: Option<TextureOrigin>,
    pub bounds: BoundingBox,
}

impl ModelStats {
    pub fn has_texture(&self) -> bool {
        self.texture_size.is_some()
    }
}

/// GPU handles of one loaded model.
///
/// Owning the set owns the allocations: replacing or dropping it releases every
/// buffer and the texture. `has_texture` is derived from the texture handle, so
/// it can never refer to a released one.
pub struct GpuResourceSet<B: GpuBackend + ?Sized> {
    vertex: B::Buffer,
    index: B::Buffer,
    index_count: u32,
    texture: Option<B::Texture>,
}

impl<B: GpuBackend + ?Sized> GpuResourceSet<B> {
    pub fn has_texture(&self) -> bool {
        self.texture.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    fn draw(&self) -> ModelDraw<'_, B> {
        ModelDraw {
            vertex: &self.vertex,
            index: &self.index,
            index_count: self.index_count,
            texture: self.texture.as_ref(),
        }
    }
}

type Listener = Box<dyn FnMut(&ViewerEvent)>;

pub struct Viewer<B: GpuBackend, I: Importer = SceneImporter> {
    backend: B,
    importer: I,
    config: ViewerConfig,
    camera: CameraState,
    projection: Projection,
    resources: Option<GpuResourceSet<B>>,
    stats: Option<ModelStats>,
    listeners: Vec<Listener>,
    redraw_requested: bool,
}

impl<B: GpuBackend> Viewer<B> {
    /// A viewer importing with the built-in [`SceneImporter`].
    pub fn new(backend: B, config: ViewerConfig, width: u32, height: u32) -> Self {
        Self::with_importer(backend, SceneImporter::default(), config, width, height)
    }
}

impl<B: GpuBackend, I: Importer> Viewer<B, I> {
    pub fn with_importer(
        backend: B,
        importer: I,
        config: ViewerConfig,
        width: u32,
        height: u32,
    ) -> Self {
        let projection = Projection::new(width, height, config.fovy, config.znear, config.zfar);
        Self {
            backend,
            importer,
            config,
            camera: CameraState::default(),
            projection,
            resources: None,
            stats: None,
            listeners: Vec::new(),
            redraw_requested: true,
        }
    }

    pub fn state(&self) -> ViewerState {
        match self.resources {
            Some(_) => ViewerState::Ready,
            None => ViewerState::Empty,
        }
    }

    pub fn stats(&self) -> Option<&ModelStats> {
        self.stats.as_ref()
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn has_texture(&self) -> bool {
        self.resources
            .as_ref()
            .is_some_and(GpuResourceSet::has_texture)
    }

    /// Register a listener for [`ViewerEvent`]s. Listeners are called in
    /// registration order, synchronously, from inside [`Viewer::load`].
    pub fn subscribe(&mut self, listener: impl FnMut(&ViewerEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Returns whether a redraw was requested since the last call, and clears it.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn emit(&mut self, event: ViewerEvent) {
        for listener in &mut self.listeners {
            listener(&event);
        }
    }

    /// Load the model at `path`, replacing the current one on success.
    ///
    /// On failure the previous model, its GPU resources and the camera are left
    /// exactly as they were. Either way the outcome is also reported to
    /// subscribers.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let path = path.as_ref();
        log::info!("Loading {}", path.display());
        match self.try_load(path) {
            Ok(name) => {
                self.emit(ViewerEvent::ModelLoaded {
                    name,
                    path: path.to_path_buf(),
                });
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to load {}: {e}", path.display());
                self.emit(ViewerEvent::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn try_load(&mut self, path: &Path) -> Result<String, LoadError> {
        let scene = self.importer.import(path)?;
        let model_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let ProcessedScene {
            geometry,
            bounds,
            texture,
        } = processor::process(scene, model_dir).map_err(|e| match e {
            ProcessError::EmptyGeometry => LoadError::EmptyGeometry {
                path: path.to_path_buf(),
            },
        })?;

        let upload_error = |source| LoadError::GpuUpload {
            path: path.to_path_buf(),
            source,
        };
        let vertex = self
            .backend
            .create_vertex_buffer("model vertex buffer", &geometry.vertices)
            .map_err(upload_error)?;
        let index = self
            .backend
            .create_index_buffer("model index buffer", &geometry.indices)
            .map_err(upload_error)?;
        if let Some(resolved) = &texture {
            self.backend
                .validate_texture(resolved)
                .map_err(upload_error)?;
        }

        // The previous texture must be gone before the next one is created.
        self.resources = None;
        self.stats = None;

        let gpu_texture = texture.as_ref().and_then(|resolved| {
            match self.backend.create_texture(resolved) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    log::warn!("Texture upload failed, drawing untextured: {e}");
                    None
                }
            }
        });
        let uploaded = gpu_texture.as_ref().and(texture.as_ref());

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let stats = ModelStats {
            name: name.clone(),
            vertex_count: geometry.vertices.len(),
            triangle_count: geometry.triangle_count(),
            texture_size: uploaded.map(|t| t.dimensions()),
            texture_origin: uploaded.map(|t| t.origin.clone()),
            bounds,
        };
        log::info!(
            "Loaded {name}: {} vertices, {} triangles, texture {:?}",
            stats.vertex_count,
            stats.triangle_count,
            stats.texture_origin
        );

        self.resources = Some(GpuResourceSet {
            vertex,
            index,
            index_count: geometry.indices.len() as u32,
            texture: gpu_texture,
        });
        self.stats = Some(stats);
        self.on_reset();
        self.request_redraw();
        Ok(name)
    }

    /// Rotate the camera around the model by a pointer delta in pixels.
    pub fn on_orbit(&mut self, dx: f32, dy: f32) {
        if self.state() == ViewerState::Empty {
            return;
        }
        self.camera.orbit(dx, dy, self.config.orbit_sensitivity);
        self.request_redraw();
    }

    pub fn on_pan(&mut self, dx: f32, dy: f32) {
        if self.state() == ViewerState::Empty {
            return;
        }
        self.camera.pan(dx, dy, self.config.pan_sensitivity);
        self.request_redraw();
    }

    /// Positive `delta` zooms in.
    pub fn on_zoom(&mut self, delta: f32) {
        if self.state() == ViewerState::Empty || delta == 0.0 {
            return;
        }
        self.camera.zoom(
            delta,
            self.config.zoom_in_factor,
            self.config.zoom_out_factor,
        );
        self.request_redraw();
    }

    /// Frame the loaded model from the default angle.
    pub fn on_reset(&mut self) {
        let Some(bounds) = self.stats.as_ref().map(|s| s.bounds) else {
            return;
        };
        self.camera.reset(&bounds, self.config.vertical_bias);
        self.request_redraw();
    }

    /// Move back to the framing distance, keeping orientation and pan.
    pub fn on_frame(&mut self) {
        if self.state() == ViewerState::Empty {
            return;
        }
        self.camera.frame();
        self.request_redraw();
    }

    pub fn on_resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
        self.backend.resize(width, height);
        self.request_redraw();
    }

    /// The uniform block the next frame is drawn with.
    pub fn uniform(&self) -> CameraUniform {
        let mut uniform = CameraUniform::new();
        uniform.update(
            &self.camera,
            &self.projection,
            self.has_texture(),
            self.config.base_colour,
        );
        uniform
    }

    /// Draw one frame. With nothing loaded this only clears the target.
    pub fn draw(&mut self) -> Result<(), GpuError> {
        let uniform = self.uniform();
        let call = DrawCall {
            clear_colour: self.config.clear_colour,
            uniform,
            model: self.resources.as_ref().map(GpuResourceSet::draw),
        };
        self.backend.draw(call)
    }
}
