// SPDX-License-Identifier: MIT OR Apache-2.0
//! Showroom application setup and event loop.

use crate::event_log::{EventLogPanel, LogEvent};
use crate::manifest::StageManifest;
use crate::manifest_watcher::{ManifestEvent, ManifestWatcher, MANIFEST_DEBOUNCE};
use crate::showroom::StageSlot;
use crate::theme::SiteTheme;
use egui_wgpu::wgpu;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

/// Showroom application errors
#[derive(Debug, Error)]
pub enum ShowroomError {
    /// Window creation failed
    #[error("Failed to create window: {0}")]
    WindowCreation(#[from] winit::error::OsError),

    /// Renderer initialization failed
    #[error("Failed to initialize renderer: {0}")]
    RendererInit(String),

    /// Event loop error
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest parse error
    #[error("Failed to parse stage manifest: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Manifest serialization error
    #[error("Failed to write stage manifest: {0}")]
    RonWrite(#[from] ron::Error),

    /// Manifest content error
    #[error("Invalid stage manifest: {0}")]
    InvalidManifest(String),

    /// Sequencer construction error
    #[error("Failed to build stage: {0}")]
    Stage(#[from] lumen_stage_sequencer::SequencerError),
}

/// Result type for showroom operations
pub type Result<T> = std::result::Result<T, ShowroomError>;

/// Graphics state for wgpu rendering
struct GraphicsState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    egui_renderer: egui_wgpu::Renderer,
}

impl GraphicsState {
    fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .map_err(|e| ShowroomError::RendererInit(e.to_string()))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| ShowroomError::RendererInit("no suitable GPU adapter".to_string()))?;

        tracing::info!("Using GPU: {}", adapter.get_info().name);

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("Lumen Showroom Device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            },
            None,
        ))
        .map_err(|e| ShowroomError::RendererInit(e.to_string()))?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| ShowroomError::RendererInit("surface has no formats".to_string()))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            egui_renderer,
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    fn render(
        &mut self,
        egui_ctx: &egui::Context,
        full_output: egui::FullOutput,
        window: &Window,
    ) -> std::result::Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Showroom Encoder"),
        });

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer.update_texture(&self.device, &self.queue, *id, image_delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Showroom Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.05,
                                g: 0.05,
                                b: 0.045,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();

            self.egui_renderer.render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        Ok(())
    }
}

/// Running state of the showroom
struct ShowroomRunning {
    window: Arc<Window>,
    graphics: GraphicsState,
    egui_ctx: egui::Context,
    egui_state: egui_winit::State,
    showroom: ShowroomInner,
}

/// Page state: stages, manifest watching and overlays
struct ShowroomInner {
    /// Manifest file, if one was loaded from disk
    manifest_path: Option<PathBuf>,
    /// Watcher reloading the manifest on change
    watcher: Option<ManifestWatcher>,
    /// Stages in page order
    stages: Vec<StageSlot>,
    theme: SiteTheme,
    event_log: EventLogPanel,
}

impl ShowroomInner {
    fn new(manifest_path: PathBuf, log_rx: Option<Receiver<LogEvent>>) -> Self {
        let theme = SiteTheme::default();

        let (manifest, manifest_path) = match StageManifest::load(&manifest_path) {
            Ok(manifest) => (manifest, Some(manifest_path)),
            Err(ShowroomError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                // Seed the missing file so it can be edited live
                let manifest = StageManifest::showroom();
                match manifest.save(&manifest_path) {
                    Ok(()) => (manifest, Some(manifest_path)),
                    Err(e) => {
                        tracing::warn!("Using built-in showroom, could not write {:?}: {}", manifest_path, e);
                        (manifest, None)
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Using built-in showroom, could not load {:?}: {}", manifest_path, e);
                (StageManifest::showroom(), None)
            }
        };

        let watcher = manifest_path.as_ref().and_then(|path| {
            ManifestWatcher::new(path, MANIFEST_DEBOUNCE)
                .map_err(|e| tracing::warn!("Manifest hot reload disabled: {}", e))
                .ok()
        });

        let mut inner = Self {
            manifest_path,
            watcher,
            stages: Vec::new(),
            theme,
            event_log: EventLogPanel::new(log_rx),
        };

        if let Err(e) = inner.rebuild(&manifest) {
            tracing::error!("Failed to build stages: {}", e);
        }
        inner
    }

    /// Replace every stage. Old stages are kept if any new one fails to build.
    fn rebuild(&mut self, manifest: &StageManifest) -> Result<()> {
        let stages = manifest
            .stages
            .iter()
            .map(|(name, spec)| StageSlot::build(name, spec, &self.theme))
            .collect::<lumen_stage_sequencer::Result<Vec<_>>>()?;

        // Dropping the old slots disposes their sequencers
        self.stages = stages;
        tracing::info!("Showroom has {} stages", self.stages.len());
        Ok(())
    }

    fn check_manifest(&mut self) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let Some(event) = watcher.poll() else {
            return;
        };
        tracing::debug!(
            "Manifest {:?} event after {} filesystem events",
            watcher.path(),
            watcher.events_seen()
        );

        match event {
            ManifestEvent::Changed(path) => {
                match StageManifest::load(&path).and_then(|manifest| self.rebuild(&manifest)) {
                    Ok(()) => tracing::info!("Reloaded stage manifest {:?}", path),
                    Err(e) => tracing::error!("Keeping current stages, manifest reload failed: {}", e),
                }
            }
            ManifestEvent::Removed(path) => {
                tracing::warn!("Stage manifest {:?} was removed, keeping current stages", path);
            }
            ManifestEvent::Error(message) => {
                tracing::warn!("Manifest watcher error: {}", message);
            }
        }
    }

    fn update(&mut self, ctx: &egui::Context) {
        self.check_manifest();

        if ctx.input(|i| i.key_pressed(egui::Key::F12)) {
            self.event_log.open = !self.event_log.open;
        }

        let now = Instant::now();
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.colors.bg_page))
            .show(ctx, |ui| {
                let viewport_height = ui.available_height();
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        let stage_size = egui::vec2(ui.available_width(), viewport_height);
                        for slot in &mut self.stages {
                            slot.show(ui, stage_size, now);
                            Self::after_stage_ui(ui, &slot.spec.after, &self.theme, viewport_height);
                        }
                    });
            });

        if let Some(path) = &self.manifest_path {
            egui::Area::new(egui::Id::new("lumen_manifest_badge"))
                .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
                .show(ctx, |ui| {
                    ui.label(
                        egui::RichText::new(format!("{} (F12: events)", path.display()))
                            .small()
                            .color(self.theme.colors.text_secondary),
                    );
                });
        }

        self.event_log.show(ctx);
    }

    fn after_stage_ui(ui: &mut egui::Ui, lines: &[String], theme: &SiteTheme, viewport_height: f32) {
        if lines.is_empty() {
            return;
        }
        egui::Frame::none()
            .inner_margin(egui::Margin::symmetric(48.0, 64.0))
            .show(ui, |ui| {
                ui.set_min_height(viewport_height * 0.4);
                for line in lines {
                    ui.label(
                        egui::RichText::new(line)
                            .size(20.0)
                            .color(theme.colors.text_secondary),
                    );
                }
            });
    }
}

/// Main showroom application
pub struct ShowroomApp {
    running: Option<ShowroomRunning>,
    manifest_path: PathBuf,
    /// Tracing receiver handed to the event log on first resume.
    log_rx: Option<Receiver<LogEvent>>,
}

impl ShowroomApp {
    /// Create a showroom for `manifest_path`
    pub fn new(manifest_path: PathBuf, log_rx: Option<Receiver<LogEvent>>) -> Self {
        Self {
            running: None,
            manifest_path,
            log_rx,
        }
    }

    /// Run the showroom until the window closes
    pub fn run(manifest_path: PathBuf, log_rx: Option<Receiver<LogEvent>>) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Wait);

        let mut app = ShowroomApp::new(manifest_path, log_rx);
        event_loop.run_app(&mut app)?;

        Ok(())
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<ShowroomRunning> {
        let window_attrs = Window::default_attributes()
            .with_title("Lumen Showroom")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 800))
            .with_min_inner_size(winit::dpi::LogicalSize::new(640, 480));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let graphics = GraphicsState::new(Arc::clone(&window))?;

        let egui_ctx = egui::Context::default();
        let showroom = ShowroomInner::new(self.manifest_path.clone(), self.log_rx.take());
        showroom.theme.apply(&egui_ctx);

        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            Some(2 * 1024),
        );

        Ok(ShowroomRunning {
            window,
            graphics,
            egui_ctx,
            egui_state,
            showroom,
        })
    }
}

impl ApplicationHandler for ShowroomApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        tracing::info!("Creating showroom window...");
        match self.start(event_loop) {
            Ok(running) => {
                tracing::info!("Window size: {:?}", running.window.inner_size());
                running.window.request_redraw();
                self.running = Some(running);
            }
            Err(e) => {
                tracing::error!("Showroom failed to start: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(running) = &mut self.running else {
            return;
        };

        let response = running.egui_state.on_window_event(&running.window, &event);
        if response.repaint {
            running.window.request_redraw();
        }

        match event {
            WindowEvent::CloseRequested => {
                tracing::info!("Close requested, exiting...");
                // Dispose sequencers before the window goes away
                running.showroom.stages.clear();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                tracing::debug!("Window resized to {:?}", new_size);
                running.graphics.resize(new_size);
                running.window.request_redraw();
            }
            WindowEvent::RedrawRequested => {
                let raw_input = running.egui_state.take_egui_input(&running.window);
                let full_output = running.egui_ctx.run(raw_input, |ctx| {
                    running.showroom.update(ctx);
                });

                let repaint_delay = full_output
                    .viewport_output
                    .get(&egui::ViewportId::ROOT)
                    .map(|v| v.repaint_delay);

                running
                    .egui_state
                    .handle_platform_output(&running.window, full_output.platform_output.clone());

                match running.graphics.render(&running.egui_ctx, full_output, &running.window) {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = running.window.inner_size();
                        running.graphics.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        tracing::error!("Out of GPU memory!");
                        event_loop.exit();
                        return;
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        tracing::warn!("Surface timeout");
                    }
                }

                // Keep animating while a transition or lock release is pending
                match repaint_delay {
                    Some(delay) if delay.is_zero() => running.window.request_redraw(),
                    Some(delay) if delay < std::time::Duration::MAX => {
                        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + delay));
                    }
                    _ => event_loop.set_control_flow(ControlFlow::Wait),
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(running) = &self.running else {
            return;
        };
        if let ControlFlow::WaitUntil(deadline) = event_loop.control_flow() {
            if Instant::now() >= deadline {
                event_loop.set_control_flow(ControlFlow::Wait);
                running.window.request_redraw();
            }
        }
    }
}
