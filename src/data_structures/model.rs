//! GPU-ready geometry.
//!
//! [`ProcessedGeometry`] is what the processor hands to the render engine: one
//! interleaved vertex array plus a `u32` triangle index list.

/// Describes how a vertex type is laid out in a vertex buffer.
pub trait VertexLayout {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// Interleaved vertex: position, texture coordinates, normal (8 floats).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
}

impl ModelVertex {
    /// Used when a source mesh has no texture coordinates.
    pub const DEFAULT_TEX_COORDS: [f32; 2] = [0.5, 0.5];
    /// Used when a source mesh has no normals.
    pub const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];

    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x3];
}

impl VertexLayout for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessedGeometry {
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
}

impl ProcessedGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }
}
