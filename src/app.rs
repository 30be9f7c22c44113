// src/app.rs
//! Viewer application state: owns the renderer, camera, controller and the
//! uploaded terrain, and translates window events into camera commands.

use crate::{
    assets::AssetDir,
    camera::{Camera, CameraCommand, CameraController, PanDirection},
    data::{self, RasterError},
    renderer::{pipelines::terrain::SceneUniforms, Renderer, TerrainDraw},
    ui::{self, HudStatus},
};
use anyhow::Result;
use glam::Mat4;
use std::sync::Arc;
use std::time::Instant;
use winit::{
    event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
    window::Window,
};

/// WGPU (Vulkan/D3D) clip-space conversion for a GL-style projection
const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0,  0.0,  0.0, 0.0,
    0.0, -1.0,  0.0, 0.0, // flip Y
    0.0,  0.0,  0.5, 0.0, // map z: [-1,1] -> [0,1]
    0.0,  0.0,  0.5, 1.0,
]);

enum SceneStatus {
    Loading,
    Ready,
    Failed,
}

pub struct App {
    pub window: Arc<Window>,
    pub renderer: Renderer,

    // UI
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,

    // Scene
    terrain: Option<TerrainDraw>,
    status: SceneStatus,

    // Camera & controls
    camera: Camera,
    controller: CameraController,
    cursor: (f64, f64),
}

impl App {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let renderer = Renderer::new(window.clone()).await?;

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &*window,
            None,
            None,
        );

        Ok(Self {
            window,
            renderer,
            egui_ctx,
            egui_state,
            terrain: None,
            status: SceneStatus::Loading,
            camera: Camera::default_pose(),
            controller: CameraController::new(),
            cursor: (0.0, 0.0),
        })
    }

    /// Builds the whole scene: DEM -> mesh, orthophoto -> texture, upload.
    /// The loads run sequentially; all pipeline errors are caught here, once.
    pub fn load_scene(&mut self, assets: &AssetDir, dem: &str, ortho: &str) {
        match Self::build_terrain(&self.renderer, assets, dem, ortho) {
            Ok(draw) => {
                log::info!(
                    "terrain ready: {} vertices, {} indices",
                    draw.vertex_count,
                    draw.index_count
                );
                self.terrain = Some(draw);
                self.status = SceneStatus::Ready;
            }
            Err(e) => {
                log::error!("error loading terrain data: {e}");
                self.terrain = None;
                self.status = SceneStatus::Failed;
            }
        }
    }

    fn build_terrain(
        renderer: &Renderer,
        assets: &AssetDir,
        dem: &str,
        ortho: &str,
    ) -> Result<TerrainDraw, RasterError> {
        let elevation = data::load_raster(assets, dem)?;
        let mesh = data::build_mesh(&elevation)?;
        drop(elevation); // grids are single-use

        let orthophoto = data::load_raster(assets, ortho)?;
        let texture = data::build_texture(&orthophoto)?;

        Ok(renderer.upload_terrain(&mesh, &texture))
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        self.renderer.resize(new_size);
    }

    /// Translates a window event into camera commands. Returns true when the
    /// event was consumed (by egui or by the wiring here).
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        // Give egui first dibs on the event
        let response = self.egui_state.on_window_event(&self.window, event);
        if response.consumed {
            return true;
        }

        match event {
            WindowEvent::Resized(size) => self.resize(*size),
            WindowEvent::MouseInput { button, state, .. } => {
                if *button == MouseButton::Left {
                    let (x, y) = self.cursor;
                    self.controller.push(match state {
                        ElementState::Pressed => CameraCommand::RotateStart { x, y },
                        ElementState::Released => CameraCommand::RotateEnd,
                    });
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = (position.x, position.y);
                self.controller.push(CameraCommand::PointerMoved {
                    x: position.x,
                    y: position.y,
                });
            }
            WindowEvent::CursorLeft { .. } => {
                // Leaving the window ends both kinds of held input.
                self.controller.push(CameraCommand::RotateEnd);
                self.controller.push(CameraCommand::PanEnd);
            }
            WindowEvent::Touch(touch) => {
                let (x, y) = (touch.location.x, touch.location.y);
                self.controller.push(match touch.phase {
                    TouchPhase::Started => CameraCommand::RotateStart { x, y },
                    TouchPhase::Moved => CameraCommand::PointerMoved { x, y },
                    TouchPhase::Ended | TouchPhase::Cancelled => CameraCommand::RotateEnd,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                // Match browser-style wheel deltas: one line notch ~ 100.
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -*y * 100.0,
                    MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
                };
                self.controller.push(CameraCommand::Zoom { delta: delta_y });
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return false; // the pan task supplies its own cadence
                }
                let direction = match event.physical_key {
                    PhysicalKey::Code(KeyCode::ArrowUp) => Some(PanDirection::Forward),
                    PhysicalKey::Code(KeyCode::ArrowDown) => Some(PanDirection::Backward),
                    PhysicalKey::Code(KeyCode::ArrowLeft) => Some(PanDirection::Left),
                    PhysicalKey::Code(KeyCode::ArrowRight) => Some(PanDirection::Right),
                    _ => None,
                };
                if let Some(direction) = direction {
                    self.controller.push(match event.state {
                        ElementState::Pressed => CameraCommand::PanStart(direction),
                        ElementState::Released => CameraCommand::PanEnd,
                    });
                } else if event.state == ElementState::Pressed {
                    match event.physical_key {
                        PhysicalKey::Code(KeyCode::KeyC) | PhysicalKey::Code(KeyCode::Space) => {
                            self.controller.push(CameraCommand::Reset);
                        }
                        _ => return false,
                    }
                } else {
                    return false;
                }
            }
            _ => return false,
        }
        true
    }

    fn update_uniforms(&mut self) {
        let aspect_ratio =
            self.renderer.context.config.width as f32 / self.renderer.context.config.height as f32;
        let view = self.camera.view_matrix();
        let proj = OPENGL_TO_WGPU_MATRIX * self.camera.projection_matrix_gl(aspect_ratio);

        self.renderer.update_scene_uniforms(SceneUniforms {
            view_proj: proj * view,
            ..Default::default()
        });
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        self.controller.update(&mut self.camera, Instant::now());
        self.update_uniforms();

        let frame = self.renderer.context.surface.get_current_texture()?;
        let swap_view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder =
            self.renderer
                .context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("Frame Encoder"),
                });

        self.renderer
            .render(&mut encoder, &swap_view, self.terrain.as_ref());

        let status = match (&self.status, &self.terrain) {
            (SceneStatus::Loading, _) => HudStatus::Loading,
            (SceneStatus::Failed, _) => HudStatus::Failed,
            (SceneStatus::Ready, Some(t)) => HudStatus::Ready {
                vertices: t.vertex_count,
                cells: t.index_count / 6,
            },
            (SceneStatus::Ready, None) => HudStatus::Failed,
        };
        let altitude = self.camera.position.z.round() as i32;

        ui::draw_hud(
            &mut self.egui_ctx,
            &mut self.egui_state,
            &mut self.renderer.egui_renderer,
            &self.window,
            &self.renderer.context,
            &mut encoder,
            &swap_view,
            &status,
            altitude,
        );

        self.renderer
            .context
            .queue
            .submit(std::iter::once(encoder.finish()));
        frame.present();

        Ok(())
    }
}
