//! Window creation and event handling via winit.
//!
//! [`AppState`] implements winit's [`ApplicationHandler`]. It prefers the GPU
//! backend and falls back to CPU frames presented through a texture when the
//! sky pipelines cannot be built on the window's device.

use std::path::PathBuf;
use std::sync::Arc;

use sky_config::{BackendPreference, CliArgs, Config};
use sky_render::{
    BackendKind, Pixmap, PixmapPresenter, RenderContext, RenderTarget, SkyEngine, SurfaceError,
    init_render_context_blocking,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::game_loop::FrameClock;

/// Pixels scrolled per wheel notch.
pub const LINE_SCROLL_PX: f32 = 40.0;

/// Re-reads `config.ron` while the window is open.
pub const RELOAD_KEY: KeyCode = KeyCode::F5;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop failed: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ))
}

/// Scroll distance in pixels for a wheel event. Positive scrolls content up.
pub fn scroll_pixels(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_SCROLL_PX,
        MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => -y as f32,
    }
}

fn is_reload_press(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && event.physical_key == PhysicalKey::Code(RELOAD_KEY)
}

/// CPU frame plus the presenter that puts it on the surface.
struct SoftwarePath {
    pixmap: Option<Pixmap>,
    presenter: PixmapPresenter,
}

/// Where the running config came from, for reloads.
pub struct ConfigSource {
    pub dir: PathBuf,
    /// Overrides re-applied on top of every reloaded file.
    pub args: CliArgs,
}

pub struct AppState {
    config: Config,
    source: Option<ConfigSource>,
    window: Option<Arc<Window>>,
    gpu: Option<RenderContext>,
    engine: SkyEngine,
    software: Option<SoftwarePath>,
    clock: FrameClock,
    scroll_offset: f32,
}

impl AppState {
    pub fn with_config(config: Config) -> Self {
        let engine = SkyEngine::new(
            config.sky_settings(),
            config.theme.palette(),
            config.render.line_width,
        );
        Self {
            config,
            source: None,
            window: None,
            gpu: None,
            engine,
            software: None,
            clock: FrameClock::new(),
            scroll_offset: 0.0,
        }
    }

    /// Enable reloading from `source`.
    pub fn with_source(mut self, source: ConfigSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Re-read the config file and apply palette and sky changes. Returns
    /// whether anything was applied. Window and backend settings take effect
    /// on the next start.
    pub fn reload_config(&mut self) -> bool {
        let Some(source) = &self.source else {
            return false;
        };
        let mut fresh = match self.config.reload(&source.dir) {
            Ok(Some(fresh)) => fresh,
            Ok(None) => return false,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return false;
            }
        };
        fresh.apply_cli_overrides(&source.args);
        if fresh == self.config {
            return false;
        }

        if let Err(e) = self.engine.set_settings(fresh.sky_settings()) {
            warn!("Reloaded config rejected: {e}");
            return false;
        }
        if fresh.theme != self.config.theme {
            self.engine.set_palette(fresh.theme.palette());
        }
        self.config = fresh;
        info!("Config reloaded");
        true
    }

    /// Pick the backend for `ctx`. Returns false if nothing can draw.
    fn select_backend(&mut self, ctx: &RenderContext) -> bool {
        let preference = self.config.render.backend;
        if preference != BackendPreference::Cpu
            && self
                .engine
                .init_gpu(&ctx.device, &ctx.queue, ctx.surface_format)
        {
            info!("Sky backend: GPU ({:?})", ctx.surface_format);
            return true;
        }
        if preference == BackendPreference::Gpu {
            warn!("GPU backend requested but unavailable, falling back to CPU");
        }

        match PixmapPresenter::new(&ctx.device, ctx.surface_format) {
            Ok(presenter) => {
                self.software = Some(SoftwarePath {
                    pixmap: None,
                    presenter,
                });
                info!("Sky backend: CPU with texture presentation");
                true
            }
            Err(e) => {
                error!("Cannot present CPU frames: {e}");
                false
            }
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(width, height);
        }
        match self.engine.resize(width, height) {
            Ok(true) => info!("Window resized to {width}x{height}"),
            Ok(false) => {}
            // Minimized windows report zero; keep the old scene until restored.
            Err(e) => debug!("Resize ignored: {e}"),
        }
    }

    fn log_stats(&self) {
        let interval = self.config.debug.stats_interval as u64;
        if interval == 0 || self.clock.frame_count() % interval != 0 {
            return;
        }
        if let Some(scene) = self.engine.scene() {
            info!(stats = ?scene.stats(), "Frame {}", self.clock.frame_count());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();
        self.engine.update(dt);
        self.log_stats();

        let Some(gpu) = &self.gpu else {
            return;
        };
        let frame = match gpu.get_current_texture() {
            Ok(frame) => frame,
            Err(SurfaceError::Timeout) => {
                warn!("Surface timeout, skipping frame");
                return;
            }
            Err(SurfaceError::Lost) => {
                let (w, h) = (gpu.surface_config.width, gpu.surface_config.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(w, h);
                }
                return;
            }
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
                return;
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let drawn = match (self.engine.backend_kind(), &mut self.software) {
            (BackendKind::Gpu, _) => self.engine.render(RenderTarget::Texture(&view)),
            (BackendKind::Cpu, Some(software)) => {
                let (w, h) = (frame.texture.width(), frame.texture.height());
                if software
                    .pixmap
                    .as_ref()
                    .is_none_or(|p| p.width() != w || p.height() != h)
                {
                    software.pixmap = Pixmap::new(w, h);
                }
                let Some(pixmap) = software.pixmap.as_mut() else {
                    return;
                };
                let drawn = self.engine.render(RenderTarget::Pixmap(&mut *pixmap));
                if drawn {
                    software
                        .presenter
                        .present(&gpu.device, &gpu.queue, pixmap, &view);
                }
                drawn
            }
            (BackendKind::Cpu, None) => false,
        };
        if !drawn {
            debug!("Frame skipped");
        }
        frame.present();
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(window_attributes_from_config(&self.config)) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };
        let size = window.inner_size();

        let ctx = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(ctx) => ctx,
            Err(e) => {
                error!("GPU initialization failed: {e}; try --headless");
                event_loop.exit();
                return;
            }
        };
        if !self.select_backend(&ctx) {
            event_loop.exit();
            return;
        }
        if let Err(e) = self.engine.init(size.width, size.height) {
            error!("Scene initialization failed: {e}");
            event_loop.exit();
            return;
        }

        self.gpu = Some(ctx);
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.engine.destroy();
                if let Some(software) = &mut self.software {
                    software.presenter.release();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_offset += scroll_pixels(delta);
                self.engine.set_scroll_offset(self.scroll_offset);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.engine
                    .set_pointer_position(Some((position.x as f32, position.y as f32)));
            }
            WindowEvent::CursorLeft { .. } => self.engine.set_pointer_position(None),
            WindowEvent::KeyboardInput { event, .. } if is_reload_press(&event) => {
                self.reload_config();
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Open the window and run until it is closed.
#[instrument(skip(config, source), fields(config_dir = %source.dir.display()))]
pub fn run(config: Config, source: ConfigSource) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::with_config(config).with_source(source);
    event_loop.run_app(&mut app)?;
    Ok(())
}
