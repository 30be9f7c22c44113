// src/renderer/mod.rs
//! The rendering orchestrator. Owns the GPU context, render targets and the
//! terrain pass, and uploads mesh/texture data to the GPU.

pub mod context;
pub mod pipelines;
pub mod targets;

use self::{
    context::GpuContext,
    pipelines::terrain::{SceneUniforms, TerrainPipeline},
    targets::RenderTargets,
};
use crate::data::{SurfaceTexture, TerrainMesh};
use anyhow::Result;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use winit::window::Window;

/// GPU resources for one uploaded terrain.
pub struct TerrainDraw {
    pub vb: wgpu::Buffer,
    pub ib: wgpu::Buffer,
    pub index_count: u32,
    pub vertex_count: u32,
    pub texture: wgpu::Texture,
    pub texture_bg: wgpu::BindGroup,
}

/// Owns all rendering-related state.
pub struct Renderer {
    pub context: GpuContext,
    pub targets: RenderTargets,
    pub terrain_pipeline: TerrainPipeline,
    pub egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let context = GpuContext::new(window).await?;
        let targets = RenderTargets::new(&context);
        let terrain_pipeline = TerrainPipeline::new(&context.device, context.surface_format);

        let egui_renderer =
            egui_wgpu::Renderer::new(&context.device, context.surface_format, None, 1);

        Ok(Self {
            context,
            targets,
            terrain_pipeline,
            egui_renderer,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.context.resize(new_size);
            self.targets = RenderTargets::new(&self.context);
        }
    }

    pub fn update_scene_uniforms(&self, uniforms: SceneUniforms) {
        self.terrain_pipeline
            .update_uniforms(&self.context.queue, uniforms);
    }

    /// Uploads mesh and texture, producing everything the terrain pass needs.
    pub fn upload_terrain(&self, mesh: &TerrainMesh, texture: &SurfaceTexture) -> TerrainDraw {
        let device = &self.context.device;

        let vb = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain VB"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let ib = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain IB"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let gpu_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Orthophoto"),
            size: wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        // write_texture requires a 256-byte row pitch.
        let row_bytes = texture.width * 4;
        let padded = ((row_bytes + 255) / 256) * 256;
        let mut staging = vec![0u8; (padded * texture.height) as usize];
        for row in 0..texture.height as usize {
            let src = &texture.pixels[row * row_bytes as usize..(row + 1) * row_bytes as usize];
            staging[row * padded as usize..row * padded as usize + row_bytes as usize]
                .copy_from_slice(src);
        }
        self.context.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &gpu_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &staging,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(texture.height),
            },
            wgpu::Extent3d {
                width: texture.width,
                height: texture.height,
                depth_or_array_layers: 1,
            },
        );

        let view = gpu_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Orthophoto Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let texture_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Terrain Texture BG"),
            layout: &self.terrain_pipeline.texture_bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        TerrainDraw {
            vb,
            ib,
            index_count: mesh.indices.len() as u32,
            vertex_count: mesh.vertices.len() as u32,
            texture: gpu_texture,
            texture_bg,
        }
    }

    /// One scene pass: clear to the sky color, draw the terrain (if any)
    /// into the MSAA target, resolving into the swapchain view.
    pub fn render(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        swap_view: &wgpu::TextureView,
        terrain: Option<&TerrainDraw>,
    ) {
        let mut rp = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.targets.msaa_color_view,
                resolve_target: Some(swap_view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.055,
                        g: 0.075,
                        b: 0.110,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        if let Some(t) = terrain {
            rp.set_pipeline(&self.terrain_pipeline.pipeline);
            rp.set_bind_group(0, &self.terrain_pipeline.scene_bg, &[]);
            rp.set_bind_group(1, &t.texture_bg, &[]);
            rp.set_vertex_buffer(0, t.vb.slice(..));
            rp.set_index_buffer(t.ib.slice(..), wgpu::IndexFormat::Uint32);
            rp.draw_indexed(0..t.index_count, 0, 0..1);
        }
    }
}
