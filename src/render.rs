//! Per-frame draw description handed to a [`GpuBackend`].
//!
//! A [`DrawCall`] borrows the handles owned by the viewer's resource set for the
//! duration of one frame. With no model loaded it only carries the clear colour.

use crate::{camera::CameraUniform, gpu::GpuBackend};

/// Geometry and texture of the loaded model.
pub struct ModelDraw<'a, B: GpuBackend + ?Sized> {
    pub vertex: &'a B::Buffer,
    pub index: &'a B::Buffer,
    pub index_count: u32,
    /// `None` draws with the flat base colour.
    pub texture: Option<&'a B::Texture>,
}

pub struct DrawCall<'a, B: GpuBackend + ?Sized> {
    pub clear_colour: wgpu::Color,
    pub uniform: CameraUniform,
    pub model: Option<ModelDraw<'a, B>>,
}
