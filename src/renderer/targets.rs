// src/renderer/targets.rs
//! Render target textures: multisampled color (resolved to the swapchain)
//! and the depth buffer. Rebuilt on resize.

use super::context::GpuContext;

pub const SAMPLE_COUNT: u32 = 4;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

pub struct RenderTargets {
    pub msaa_color: wgpu::Texture,
    pub msaa_color_view: wgpu::TextureView,
    pub depth: wgpu::Texture,
    pub depth_view: wgpu::TextureView,
}

impl RenderTargets {
    pub fn new(gpu: &GpuContext) -> Self {
        let size = wgpu::Extent3d {
            width: gpu.config.width,
            height: gpu.config.height,
            depth_or_array_layers: 1,
        };

        let make_tex = |label, format| {
            let tex = gpu.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size,
                mip_level_count: 1,
                sample_count: SAMPLE_COUNT,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            });
            let view = tex.create_view(&wgpu::TextureViewDescriptor::default());
            (tex, view)
        };

        let (msaa_color, msaa_color_view) = make_tex("Color MS", gpu.surface_format);
        let (depth, depth_view) = make_tex("Depth MS", DEPTH_FORMAT);

        Self {
            msaa_color,
            msaa_color_view,
            depth,
            depth_view,
        }
    }
}
