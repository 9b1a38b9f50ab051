//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helpers for creating depth textures and uploading decoded RGBA images
//! together with a CPU-built mip chain.

use image::{RgbaImage, imageops::FilterType};

/// A GPU texture and its default view. Samplers are shared and owned by the
/// render context.
///
/// Dropping a `Texture` releases the underlying GPU allocation.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// Upload an RGBA8 image as an sRGB colour texture.
    ///
    /// With `mipmapped` set, the full mip chain down to 1x1 is generated on the
    /// CPU and written level by level.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        mipmapped: bool,
    ) -> Self {
        let levels = if mipmapped {
            mip_chain(img)
        } else {
            vec![img.clone()]
        };

        let size = wgpu::Extent3d {
            width: img.width(),
            height: img.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            let (width, height) = level.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                level.as_raw(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * width),
                    rows_per_image: Some(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }

    /// A 1x1 white texture bound whenever the model has no texture of its own.
    pub fn create_placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        Self::from_rgba(device, queue, &img, Some("placeholder texture"), false)
    }
}

/// Number of mip levels for a `width` x `height` image, including the base level.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Base image followed by successively halved levels down to 1x1.
pub fn mip_chain(img: &RgbaImage) -> Vec<RgbaImage> {
    let count = mip_level_count(img.width(), img.height());
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(img.clone());
    for level in 1..count {
        let width = (img.width() >> level).max(1);
        let height = (img.height() >> level).max(1);
        let prev = &levels[level as usize - 1];
        let next = image::imageops::resize(prev, width, height, FilterType::Triangle);
        levels.push(next);
    }
    levels
}

/// Repeat addressing with linear min/mag/mip filtering.
pub fn create_default_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
