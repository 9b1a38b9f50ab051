//! The seam between the viewer and the graphics device.
//!
//! [`crate::viewer::Viewer`] never talks to wgpu directly. It creates buffers and
//! textures through a [`GpuBackend`] and owns the returned handles; dropping a
//! handle releases the GPU allocation behind it. [`crate::context::Context`] is
//! the wgpu implementation, tests plug in a recording fake.

use thiserror::Error;

use crate::{
    data_structures::model::ModelVertex, render::DrawCall, resources::texture::ResolvedTexture,
};

#[derive(Debug, Error)]
pub enum GpuError {
    #[error("buffer of {size} bytes exceeds the device limit of {limit} bytes")]
    BufferTooLarge { size: u64, limit: u64 },
    #[error("texture of {width}x{height} exceeds the device limit of {limit} pixels per side")]
    TextureTooLarge { width: u32, height: u32, limit: u32 },
    #[error("texture has no pixels")]
    EmptyTexture,
    #[error("surface unavailable: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

pub trait GpuBackend {
    type Buffer;
    type Texture;

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
    ) -> Result<Self::Buffer, GpuError>;

    fn create_index_buffer(&mut self, label: &str, indices: &[u32])
    -> Result<Self::Buffer, GpuError>;

    /// Reject a texture this device can never hold, before anything is released
    /// to make room for it.
    fn validate_texture(&self, _texture: &ResolvedTexture) -> Result<(), GpuError> {
        Ok(())
    }

    /// Upload a decoded texture with a full mip chain.
    fn create_texture(&mut self, texture: &ResolvedTexture) -> Result<Self::Texture, GpuError>;

    /// Match the render targets to a new framebuffer size. Zero-sized requests
    /// are ignored by the backend.
    fn resize(&mut self, width: u32, height: u32);

    /// Clear the target and, if `call.model` is set, draw it.
    fn draw(&mut self, call: DrawCall<'_, Self>) -> Result<(), GpuError>;
}
