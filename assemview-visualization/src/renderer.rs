//! Per-window frame renderer
//!
//! Draws the scene meshes and the egui overlay into one multisampled render
//! pass that shares the window's depth buffer and resolves into the surface.

use std::sync::Arc;

use assemview_core::{DrawItem, Error, Result};
use assemview_gpu::{CameraUniform, GpuContext, SceneRenderer, DEPTH_FORMAT};
use winit::window::Window;

/// Tessellated egui output for one frame
pub struct UiFrame {
    pub primitives: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

/// Owns the surface and both renderers of a viewer window
pub struct FrameRenderer {
    gpu: GpuContext,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    sample_count: u32,
    /// `None` when rendering single-sampled
    msaa_view: Option<wgpu::TextureView>,
    depth_view: wgpu::TextureView,
    scene: SceneRenderer,
    egui: egui_wgpu::Renderer,
    clear_color: wgpu::Color,
}

impl FrameRenderer {
    pub async fn new(window: Arc<Window>, background: [f64; 4]) -> Result<Self> {
        let size = window.inner_size();
        let (gpu, surface) = GpuContext::for_window(window).await?;
        let config = gpu.surface_config(&surface, size.width, size.height)?;
        surface.configure(&gpu.device, &config);
        log::debug!(
            "Surface configured as {:?} at {}x{}",
            config.format,
            config.width,
            config.height
        );

        let sample_count = gpu.sample_count(config.format);
        log::debug!("Rendering with {}x multisampling", sample_count);

        let msaa_view = create_msaa_view(&gpu, &config, sample_count);
        let depth_view = gpu.create_depth_view(config.width, config.height, sample_count);
        let scene = SceneRenderer::new(&gpu.device, config.format, DEPTH_FORMAT, sample_count);
        let egui = egui_wgpu::Renderer::new(
            &gpu.device,
            config.format,
            Some(DEPTH_FORMAT),
            sample_count,
        );
        let [r, g, b, a] = background;

        Ok(Self {
            gpu,
            surface,
            config,
            sample_count,
            msaa_view,
            depth_view,
            scene,
            egui,
            clear_color: wgpu::Color { r, g, b, a },
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.gpu.device, &self.config);
        self.msaa_view = create_msaa_view(&self.gpu, &self.config, self.sample_count);
        self.depth_view = self
            .gpu
            .create_depth_view(width, height, self.sample_count);
    }

    /// Forget every uploaded mesh
    pub fn clear_scene(&mut self) {
        self.scene.clear();
    }

    pub fn render(
        &mut self,
        camera: &CameraUniform,
        items: &[DrawItem],
        ui: UiFrame,
    ) -> Result<()> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.gpu.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Surface timed out, skipping frame");
                return Ok(());
            }
            Err(e) => return Err(Error::Gpu(format!("Failed to acquire frame: {}", e))),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.scene.update_camera(&self.gpu.queue, camera);
        self.scene.prepare(&self.gpu.device, &self.gpu.queue, items);

        for (id, delta) in &ui.textures_delta.set {
            self.egui
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, delta);
        }
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: ui.pixels_per_point,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        let egui_commands = self.egui.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &ui.primitives,
            &screen,
        );

        let color_attachment = match &self.msaa_view {
            Some(msaa_view) => wgpu::RenderPassColorAttachment {
                view: msaa_view,
                resolve_target: Some(&view),
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Discard,
                },
            },
            None => wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
            },
        };

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Frame Pass"),
                color_attachments: &[Some(color_attachment)],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.scene.draw(&mut pass);
            self.egui.render(&mut pass, &ui.primitives, &screen);
        }

        self.gpu
            .queue
            .submit(egui_commands.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();

        for id in &ui.textures_delta.free {
            self.egui.free_texture(id);
        }
        Ok(())
    }
}

fn create_msaa_view(
    gpu: &GpuContext,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> Option<wgpu::TextureView> {
    (sample_count > 1).then(|| {
        gpu.create_msaa_view(config.format, config.width, config.height, sample_count)
    })
}
