//! wgpu device, surface and pipeline state.
//!
//! [`Context`] is the production [`GpuBackend`]: it owns the surface, the model
//! pipeline, the uniform buffer and the depth target, and turns a [`DrawCall`]
//! into one render pass.

use std::{iter, sync::Arc};

use anyhow::Context as _;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::{
    camera::CameraUniform,
    data_structures::{model::ModelVertex, texture::Texture},
    gpu::{GpuBackend, GpuError},
    pipelines::basic,
    render::DrawCall,
    resources::texture::ResolvedTexture,
};

/// A model texture on the GPU together with the bind group sampling it.
///
/// Dropping it frees both.
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

#[derive(Debug)]
pub struct Context {
    pub(crate) window: Arc<Window>,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: Texture,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    diffuse_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    // bound whenever the model has no texture of its own
    placeholder: GpuTexture,
    is_surface_configured: bool,
}

impl Context {
    pub async fn new(window: Arc<Window>) -> anyhow::Result<Self> {
        let size = window.inner_size();

        log::info!("WGPU setup");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window.clone())
            .context("failed to create a surface for the window")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable graphics adapter")?;
        log::debug!("Using adapter {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
                ..Default::default()
            })
            .await
            .context("failed to open the graphics device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        // Colours are written as linear values, so prefer an sRGB surface.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .context("the surface reports no supported formats")?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[CameraUniform::new()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let uniform_layout = basic::uniform_layout(&device);
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
            label: Some("uniform_bind_group"),
        });

        let diffuse_layout = basic::diffuse_layout(&device);
        let pipeline =
            basic::mk_model_pipeline(&device, config.format, &uniform_layout, &diffuse_layout);

        let sampler = crate::data_structures::texture::create_default_sampler(&device);
        let placeholder_texture = Texture::create_placeholder(&device, &queue);
        let placeholder = GpuTexture {
            bind_group: basic::diffuse_bind_group(
                &device,
                &diffuse_layout,
                &placeholder_texture,
                &sampler,
                "placeholder_bind_group",
            ),
            texture: placeholder_texture,
        };

        let depth_texture =
            Texture::create_depth_texture(&device, [config.width, config.height], "depth_texture");

        let mut ctx = Self {
            window,
            surface,
            device,
            queue,
            config,
            depth_texture,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            diffuse_layout,
            sampler,
            placeholder,
            is_surface_configured: false,
        };
        ctx.resize(size.width, size.height);
        Ok(ctx)
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Reconfigure the surface at its current size, e.g. after it was lost.
    pub fn reconfigure(&mut self) {
        let size = self.window.inner_size();
        self.resize(size.width, size.height);
    }

    fn check_buffer_size(&self, size: u64) -> Result<(), GpuError> {
        let limit = self.device.limits().max_buffer_size;
        if size > limit {
            return Err(GpuError::BufferTooLarge { size, limit });
        }
        Ok(())
    }
}

impl GpuBackend for Context {
    type Buffer = wgpu::Buffer;
    type Texture = GpuTexture;

    fn create_vertex_buffer(
        &mut self,
        label: &str,
        vertices: &[ModelVertex],
    ) -> Result<Self::Buffer, GpuError> {
        let contents: &[u8] = bytemuck::cast_slice(vertices);
        self.check_buffer_size(contents.len() as u64)?;
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            }))
    }

    fn create_index_buffer(
        &mut self,
        label: &str,
        indices: &[u32],
    ) -> Result<Self::Buffer, GpuError> {
        let contents: &[u8] = bytemuck::cast_slice(indices);
        self.check_buffer_size(contents.len() as u64)?;
        Ok(self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::INDEX,
            }))
    }

    fn validate_texture(&self, resolved: &ResolvedTexture) -> Result<(), GpuError> {
        let (width, height) = resolved.dimensions();
        let limit = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 {
            return Err(GpuError::EmptyTexture);
        }
        if width > limit || height > limit {
            return Err(GpuError::TextureTooLarge {
                width,
                height,
                limit,
            });
        }
        Ok(())
    }

    fn create_texture(&mut self, resolved: &ResolvedTexture) -> Result<Self::Texture, GpuError> {
        self.validate_texture(resolved)?;

        let texture = Texture::from_rgba(
            &self.device,
            &self.queue,
            &resolved.image,
            Some("model texture"),
            true,
        );
        let bind_group = basic::diffuse_bind_group(
            &self.device,
            &self.diffuse_layout,
            &texture,
            &self.sampler,
            "model_diffuse_bind_group",
        );
        Ok(GpuTexture {
            texture,
            bind_group,
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Texture::create_depth_texture(
                &self.device,
                [self.config.width, self.config.height],
                "depth_texture",
            );
            self.is_surface_configured = true;
        }
    }

    fn draw(&mut self, call: DrawCall<'_, Self>) -> Result<(), GpuError> {
        // Rendering requires the surface to be configured
        if !self.is_surface_configured {
            return Ok(());
        }

        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[call.uniform]));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(call.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
                ..Default::default()
            });

            if let Some(model) = call.model.as_ref().filter(|m| m.index_count > 0) {
                let diffuse = model.texture.unwrap_or(&self.placeholder);
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                render_pass.set_bind_group(1, &diffuse.bind_group, &[]);
                render_pass.set_vertex_buffer(0, model.vertex.slice(..));
                render_pass.set_index_buffer(model.index.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..model.index_count, 0, 0..1);
            }
        }

        self.queue.submit(iter::once(encoder.finish()));
        self.window.pre_present_notify();
        output.present();
        Ok(())
    }
}
