//! Closed set of render backends and their targets.

use sky_core::{HostProjection, SkyScene};
use tiny_skia::Pixmap;

use crate::cpu::CpuBackend;
use crate::gpu_backend::GpuBackend;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    Cpu,
    Gpu,
}

/// Where a frame goes. The CPU backend draws into pixmaps, the GPU backend
/// into texture views.
pub enum RenderTarget<'a> {
    Pixmap(&'a mut Pixmap),
    Texture(&'a wgpu::TextureView),
}

pub enum SkyBackend {
    Cpu(CpuBackend),
    Gpu(Box<GpuBackend>),
}

impl SkyBackend {
    pub fn kind(&self) -> BackendKind {
        match self {
            SkyBackend::Cpu(_) => BackendKind::Cpu,
            SkyBackend::Gpu(_) => BackendKind::Gpu,
        }
    }

    pub fn host_projection(&self) -> HostProjection {
        match self {
            SkyBackend::Cpu(cpu) => cpu.host_projection(),
            SkyBackend::Gpu(gpu) => gpu.host_projection(),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        match self {
            // The CPU layer is keyed on size and repaints on its own.
            SkyBackend::Cpu(_) => {}
            SkyBackend::Gpu(gpu) => gpu.resize(width, height),
        }
    }

    /// Render into a matching target. Mismatched pairs skip the frame.
    pub fn render(&mut self, scene: &SkyScene, target: RenderTarget<'_>) -> bool {
        match (self, target) {
            (SkyBackend::Cpu(cpu), RenderTarget::Pixmap(pixmap)) => cpu.render(scene, pixmap),
            (SkyBackend::Gpu(gpu), RenderTarget::Texture(view)) => gpu.render(scene, view),
            (backend, _) => {
                log::trace!("{:?} backend cannot draw into this target", backend.kind());
                false
            }
        }
    }

    pub fn release(&mut self) {
        match self {
            SkyBackend::Cpu(cpu) => cpu.release(),
            SkyBackend::Gpu(gpu) => gpu.release(),
        }
    }
}
