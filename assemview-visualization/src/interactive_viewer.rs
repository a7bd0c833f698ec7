//! Interactive assembly viewer
//!
//! One window: the part tree on the left and the 3D scene behind it. Each
//! redraw drains finished mesh loads, runs the tree panel, dispatches its
//! clicks, steps the orbit controls and draws.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assemview_core::{Assembly, ClickOutcome, Error, Result, TreeClick, ViewerContext};
use assemview_gpu::CameraUniform;
use assemview_io::ThreadedMeshLoader;
use winit::{
    dpi::LogicalSize,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::Key,
    window::{Window, WindowBuilder},
};

use crate::camera::{Camera, OrbitControls};
use crate::config::ViewerConfig;
use crate::renderer::{FrameRenderer, UiFrame};
use crate::tree_panel::{self, PanelOutput};

/// Wheel pixels that count as one line step
const PIXELS_PER_LINE: f64 = 100.0;

/// Which drag gesture the mouse buttons select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Rotate,
    Pan,
}

/// Mouse button and cursor tracking between events
#[derive(Debug, Default, Clone)]
pub struct PointerState {
    last_position: Option<(f64, f64)>,
    rotating: bool,
    panning: bool,
}

impl PointerState {
    pub fn set_button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.rotating = pressed,
            MouseButton::Right => self.panning = pressed,
            _ => {}
        }
    }

    pub fn mode(&self) -> Option<DragMode> {
        if self.rotating {
            Some(DragMode::Rotate)
        } else if self.panning {
            Some(DragMode::Pan)
        } else {
            None
        }
    }

    /// Record a cursor move and return the drag it makes, if a button is
    /// held
    pub fn moved(&mut self, x: f64, y: f64) -> Option<(DragMode, f32, f32)> {
        let last = self.last_position.replace((x, y));
        let mode = self.mode()?;
        let (last_x, last_y) = last?;
        Some((mode, (x - last_x) as f32, (y - last_y) as f32))
    }

    pub fn left_window(&mut self) {
        self.last_position = None;
    }
}

/// The viewer state that lives for one window
pub struct InteractiveViewer {
    config: ViewerConfig,
    context: ViewerContext,
    camera: Camera,
    controls: OrbitControls,
    pointer: PointerState,
    viewport_height: f32,
}

impl InteractiveViewer {
    /// Build the viewer for `assembly`, resolving mesh references against
    /// `base_dir`. Mesh loads start immediately.
    pub fn new(
        assembly: Assembly,
        base_dir: impl Into<PathBuf>,
        config: ViewerConfig,
    ) -> Result<Self> {
        let loader = ThreadedMeshLoader::new(base_dir);
        let context = ViewerContext::new(assembly, &loader)?;
        let aspect = (config.window.width / config.window.height.max(1.0)) as f32;
        let camera = Camera::from_config(&config.camera, aspect);
        let controls = OrbitControls::new(&config.controls);
        let viewport_height = config.window.height as f32;

        Ok(Self {
            config,
            context,
            camera,
            controls,
            pointer: PointerState::default(),
            viewport_height,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn context(&self) -> &ViewerContext {
        &self.context
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn controls_mut(&mut self) -> &mut OrbitControls {
        &mut self.controls
    }

    /// Replace the shown assembly with the one stored at `path`.
    ///
    /// The current context is only torn down once the new one is built, so
    /// a bad file leaves the viewer unchanged.
    pub fn open_assembly(&mut self, path: &Path) -> Result<()> {
        let (assembly, base_dir) = assemview_io::read_assembly(path)?;
        let loader = ThreadedMeshLoader::new(base_dir);
        let context = ViewerContext::new(assembly, &loader)?;

        let previous = std::mem::replace(&mut self.context, context);
        let previous = previous.teardown();
        log::info!(
            "Opened {} ({} nodes), closed '{}'",
            path.display(),
            self.context.assembly().node_count(),
            previous.root().name
        );

        self.controls.reset(&mut self.camera, &self.config.camera);
        Ok(())
    }

    /// Apply every mesh load that finished since the last call
    pub fn pump(&mut self) -> Result<usize> {
        self.context.pump()
    }

    /// Dispatch tree panel clicks in the order they happened
    pub fn apply_clicks(&mut self, clicks: &[TreeClick]) -> Result<()> {
        for &click in clicks {
            match self.context.handle_click(click)? {
                ClickOutcome::Ignored => log::debug!("Ignored click on {}", click.item),
                outcome => log::debug!("{:?}", outcome),
            }
        }
        Ok(())
    }

    /// Step the orbit controls. Returns true when the camera moved.
    pub fn advance_camera(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_viewport(width, height);
        self.viewport_height = height as f32;
    }

    /// Frame the visible part of the scene; false when nothing is loaded
    pub fn frame_visible(&mut self) -> bool {
        match self.context.scene().visible_bounds() {
            Some(bounds) => {
                self.controls.frame(&mut self.camera, bounds);
                true
            }
            None => false,
        }
    }

    pub fn reset_camera(&mut self) {
        self.controls.reset(&mut self.camera, &self.config.camera);
    }

    /// Feed a window event that egui did not consume to the camera
    pub fn handle_input(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                self.pointer
                    .set_button(*button, *state == ElementState::Pressed);
            }
            WindowEvent::CursorMoved { position, .. } => {
                match self.pointer.moved(position.x, position.y) {
                    Some((DragMode::Rotate, dx, dy)) => {
                        self.controls.rotate_drag(dx, dy, self.viewport_height)
                    }
                    Some((DragMode::Pan, dx, dy)) => {
                        self.controls
                            .pan_drag(dx, dy, self.viewport_height, &self.camera)
                    }
                    None => {}
                }
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left_window(),
            WindowEvent::MouseWheel { delta, .. } => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
                };
                self.controls.dolly(steps);
            }
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let Key::Character(c) = &event.logical_key {
                    match c.as_str() {
                        "r" | "R" => self.reset_camera(),
                        "f" | "F" => {
                            if !self.frame_visible() {
                                log::debug!("Nothing visible to frame");
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn open_from_dialog(&mut self, renderer: &mut FrameRenderer) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Assembly", &["json"])
            .pick_file()
        else {
            return;
        };
        match self.open_assembly(&path) {
            Ok(()) => renderer.clear_scene(),
            Err(e) => log::error!("Failed to open {}: {}", path.display(), e),
        }
    }

    fn redraw(
        &mut self,
        window: &Window,
        egui_ctx: &egui::Context,
        egui_state: &mut egui_winit::State,
        renderer: &mut FrameRenderer,
    ) -> Result<()> {
        let loaded = self.pump()?;
        if loaded > 0 {
            log::debug!("{} meshes arrived, {} pending", loaded, self.context.pending_loads());
        }

        let raw_input = egui_state.take_egui_input(window);
        let mut panel = PanelOutput::default();
        let full_output = egui_ctx.run(raw_input, |ctx| {
            panel = tree_panel::show(ctx, self.context.tree(), self.config.tree_panel_width);
        });
        egui_state.handle_platform_output(window, full_output.platform_output);

        self.apply_clicks(&panel.clicks)?;
        if panel.open_requested {
            self.open_from_dialog(renderer);
        }
        self.advance_camera();

        let camera = CameraUniform::new(
            &self.camera.view_matrix(),
            &self.camera.projection_matrix(),
        );
        let items = self.context.scene().drawables();
        let ui = UiFrame {
            primitives: egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point),
            textures_delta: full_output.textures_delta,
            pixels_per_point: full_output.pixels_per_point,
        };
        renderer.render(&camera, &items, ui)
    }

    /// Open the window and run until it is closed
    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()
            .map_err(|e| Error::Visualization(format!("Failed to create event loop: {}", e)))?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(self.config.window.title.as_str())
                .with_inner_size(LogicalSize::new(
                    self.config.window.width,
                    self.config.window.height,
                ))
                .build(&event_loop)
                .map_err(|e| Error::Visualization(format!("Failed to create window: {}", e)))?,
        );

        let mut renderer = pollster::block_on(FrameRenderer::new(
            window.clone(),
            self.config.background,
        ))?;
        let (width, height) = renderer.size();
        self.set_viewport(width, height);

        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &*window,
            Some(window.scale_factor() as f32),
            None,
        );

        log::info!(
            "Viewer started with {} nodes, {} meshes loading",
            self.context.assembly().node_count(),
            self.context.pending_loads()
        );

        let mut failure = None;
        window.request_redraw();
        event_loop
            .run(|event, target| {
                target.set_control_flow(ControlFlow::Wait);
                let Event::WindowEvent { window_id, event } = event else {
                    return;
                };
                if window_id != window.id() {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => target.exit(),
                    WindowEvent::Resized(size) => {
                        renderer.resize(size.width, size.height);
                        self.set_viewport(size.width, size.height);
                        window.request_redraw();
                    }
                    WindowEvent::RedrawRequested => {
                        if let Err(e) =
                            self.redraw(&window, &egui_ctx, &mut egui_state, &mut renderer)
                        {
                            log::error!("Frame failed: {}", e);
                            failure = Some(e);
                            target.exit();
                            return;
                        }
                        window.request_redraw();
                    }
                    other => {
                        let response = egui_state.on_window_event(&window, &other);
                        if !response.consumed {
                            self.handle_input(&other);
                        }
                    }
                }
            })
            .map_err(|e| Error::Visualization(format!("Event loop error: {}", e)))?;

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
