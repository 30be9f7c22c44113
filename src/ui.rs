// src/ui.rs
//! HUD overlay: loading indicator, terrain stats, or the error line when
//! scene construction failed.

use crate::renderer::context::GpuContext;
use winit::window::Window;

/// What the status line should say this frame.
pub enum HudStatus {
    Loading,
    Ready { vertices: u32, cells: u32 },
    Failed,
}

#[allow(clippy::too_many_arguments)]
pub fn draw_hud(
    egui_ctx: &mut egui::Context,
    egui_state: &mut egui_winit::State,
    egui_renderer: &mut egui_wgpu::Renderer,
    window: &Window,
    gpu_context: &GpuContext,
    encoder: &mut wgpu::CommandEncoder,
    swap_view: &wgpu::TextureView,
    status: &HudStatus,
    altitude: i32,
) {
    let egui_input = egui_state.take_egui_input(window);
    egui_ctx.begin_frame(egui_input);

    {
        use egui::{Area, Frame, RichText};
        Area::new("hud_text".into())
            .interactable(false)
            .movable(false)
            .order(egui::Order::Foreground)
            .fixed_pos(egui::pos2(16.0, 16.0))
            .show(egui_ctx, |ui| {
                Frame::none().show(ui, |ui| {
                    let ok = egui::Color32::from_rgb(180, 220, 180);
                    let err = egui::Color32::from_rgb(235, 110, 100);
                    match status {
                        HudStatus::Loading => {
                            ui.label(RichText::new("LOADING TERRAIN DATA...").monospace().color(ok));
                        }
                        HudStatus::Ready { vertices, cells } => {
                            ui.label(
                                RichText::new(format!("TERRAIN: {vertices} VERTICES / {cells} CELLS"))
                                    .monospace()
                                    .color(ok),
                            );
                            ui.label(RichText::new(format!("ALTITUDE: {altitude}")).monospace().color(ok));
                            ui.label(
                                RichText::new("DRAG: ORBIT   ARROWS: MOVE   WHEEL: ZOOM   C: CENTER")
                                    .monospace()
                                    .color(egui::Color32::GRAY),
                            );
                        }
                        HudStatus::Failed => {
                            ui.label(
                                RichText::new("ERROR LOADING TERRAIN DATA")
                                    .monospace()
                                    .color(err)
                                    .strong(),
                            );
                        }
                    }
                });
            });
    }

    let egui_output = egui_ctx.end_frame();
    let shapes = egui_ctx.tessellate(egui_output.shapes, egui_ctx.pixels_per_point());

    let screen_descriptor = egui_wgpu::ScreenDescriptor {
        size_in_pixels: [gpu_context.config.width, gpu_context.config.height],
        pixels_per_point: egui_state.egui_ctx().pixels_per_point(),
    };

    for (id, delta) in &egui_output.textures_delta.set {
        egui_renderer.update_texture(&gpu_context.device, &gpu_context.queue, *id, delta);
    }
    egui_renderer.update_buffers(
        &gpu_context.device,
        &gpu_context.queue,
        encoder,
        &shapes,
        &screen_descriptor,
    );

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("HUD"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: swap_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        egui_renderer.render(&mut render_pass, &shapes, &screen_descriptor);
    }

    for id in &egui_output.textures_delta.free {
        egui_renderer.free_texture(id);
    }
}
