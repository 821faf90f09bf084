//! The surface a host application drives each frame.
//!
//! Call order per frame is `update` then `render`. Scroll and pointer input
//! may arrive at any time between frames and take effect on the next update.

use glam::Vec2;
use sky_core::{SceneError, SkyScene, SkySettings, ThemePalette};

use crate::backend::{BackendKind, RenderTarget, SkyBackend};
use crate::cpu::CpuBackend;
use crate::gpu_backend::GpuBackend;

pub struct SkyEngine {
    settings: SkySettings,
    palette: ThemePalette,
    line_width: f32,
    scene: Option<SkyScene>,
    backend: SkyBackend,
    scroll_offset: f32,
    pointer: Option<Vec2>,
    destroyed: bool,
}

impl SkyEngine {
    /// An engine on the CPU backend. Nothing is built until [`init`](Self::init).
    pub fn new(settings: SkySettings, palette: ThemePalette, line_width: f32) -> Self {
        Self {
            settings,
            palette,
            line_width,
            scene: None,
            backend: SkyBackend::Cpu(CpuBackend::new(line_width)),
            scroll_offset: 0.0,
            pointer: None,
            destroyed: false,
        }
    }

    /// Build the scene for a `width` x `height` viewport.
    pub fn init(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        let scene = SkyScene::new(self.settings, self.palette, width, height)?;
        self.install_scene(scene);
        self.destroyed = false;
        Ok(())
    }

    /// Rebuild the scene at its current size with new settings. Returns
    /// `Ok(false)` when nothing changed. Rejected settings keep the old scene.
    pub fn set_settings(&mut self, settings: SkySettings) -> Result<bool, SceneError> {
        if settings == self.settings {
            return Ok(false);
        }
        if let Some(scene) = &self.scene {
            let rebuilt = SkyScene::new(settings, self.palette, scene.width(), scene.height())?;
            self.install_scene(rebuilt);
        } else if let Some((field, reason)) = settings.invalid_field() {
            return Err(SceneError::InvalidSetting { field, reason });
        }
        self.settings = settings;
        Ok(true)
    }

    /// A fresh scene restarts its epoch count, so backend caches keyed on the
    /// old one are dropped.
    fn install_scene(&mut self, mut scene: SkyScene) {
        scene.set_scroll_offset(self.scroll_offset);
        scene.set_pointer_position(self.pointer);
        self.backend.release();
        self.backend.resize(scene.width(), scene.height());
        self.scene = Some(scene);
    }

    /// Switch to the GPU backend. Returns false, and stays on the current
    /// backend, if the pipelines cannot be built on this device.
    pub fn init_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
    ) -> bool {
        match GpuBackend::new(device, queue, format, self.line_width) {
            Ok(gpu) => {
                self.backend.release();
                self.backend = SkyBackend::Gpu(Box::new(gpu));
                true
            }
            Err(e) => {
                log::warn!("GPU sky backend unavailable, staying on {:?}: {e}", self.backend.kind());
                false
            }
        }
    }

    /// Drop any GPU backend and render on the CPU from now on.
    pub fn use_cpu(&mut self) {
        if self.backend.kind() != BackendKind::Cpu {
            self.backend.release();
            self.backend = SkyBackend::Cpu(CpuBackend::new(self.line_width));
            log::info!("Sky backend switched to CPU");
        }
    }

    /// Rebuild for a new viewport size. Returns whether anything changed.
    /// A rejected size leaves the current scene in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<bool, SceneError> {
        let Some(scene) = self.scene.as_mut() else {
            return Ok(false);
        };
        let changed = scene.resize(width, height)?;
        if changed {
            self.backend.resize(width, height);
        }
        Ok(changed)
    }

    pub fn update(&mut self, dt_ms: f32) {
        if self.destroyed {
            return;
        }
        let mode = self.backend.host_projection();
        if let Some(scene) = self.scene.as_mut() {
            scene.update(dt_ms, mode);
        }
    }

    /// Draw the last update. Returns false when nothing was drawn.
    pub fn render(&mut self, target: RenderTarget<'_>) -> bool {
        if self.destroyed {
            return false;
        }
        match self.scene.as_ref() {
            Some(scene) => self.backend.render(scene, target),
            None => false,
        }
    }

    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll_offset = offset;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_scroll_offset(offset);
        }
    }

    /// Pointer position in pixels, or `None` when the pointer left the viewport.
    pub fn set_pointer_position(&mut self, position: Option<(f32, f32)>) {
        self.pointer = position.map(|(x, y)| Vec2::new(x, y));
        if let Some(scene) = self.scene.as_mut() {
            scene.set_pointer_position(self.pointer);
        }
    }

    /// Retint and rebuild the scene.
    pub fn set_palette(&mut self, palette: ThemePalette) {
        self.palette = palette;
        if let Some(scene) = self.scene.as_mut() {
            scene.set_palette(palette);
        }
    }

    /// Release backend resources and the scene. Later updates and renders do
    /// nothing until [`init`](Self::init) is called again.
    pub fn destroy(&mut self) {
        self.backend.release();
        self.scene = None;
        self.destroyed = true;
        log::info!("Sky engine destroyed");
    }

    pub fn settings(&self) -> &SkySettings {
        &self.settings
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn scene(&self) -> Option<&SkyScene> {
        self.scene.as_ref()
    }
}
