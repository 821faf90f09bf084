//! Night-sky rendering: a tiny-skia software backend, a wgpu backend, and the
//! [`SkyEngine`] surface that picks between them.

pub mod backend;
pub mod composite;
pub mod cpu;
pub mod engine;
pub mod gpu;
pub mod gpu_backend;
pub mod pass;
pub mod present;
pub mod shader;
pub mod shaders;
pub mod sprites;

pub use backend::{BackendKind, RenderTarget, SkyBackend};
pub use cpu::{CpuBackend, paint_background};
pub use engine::SkyEngine;
pub use gpu::{
    RenderContext, RenderContextError, SurfaceError, init_render_context_blocking,
    request_headless_device,
};
pub use gpu_backend::{GpuBackend, GpuBackendError, SkyUniform};
pub use pass::{RenderPassBuilder, clear_color};
pub use present::PixmapPresenter;
pub use shader::{ShaderError, create_validated_module, validate_wgsl};

/// Re-exported so hosts can build CPU targets without a direct dependency.
pub use tiny_skia::Pixmap;
