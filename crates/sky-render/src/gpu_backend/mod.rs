//! The accelerated renderer.
//!
//! Star projection and twinkle run in the vertex stage against a storage
//! buffer uploaded once per scene build. Lines are rebuilt on the host each
//! frame because only lit ones are drawn. Nebulae and galaxies go into an
//! offscreen layer that is redrawn only when the background cache says so.

mod glow;
mod lines;
mod stars;

pub use glow::GlowInstance;
pub use lines::{LineVertex, line_quad};
pub use stars::GpuStar;

use bytemuck::{Pod, Zeroable};
use sky_core::{HostProjection, SkyScene};
use static_assertions::assert_eq_size;
use thiserror::Error;

use crate::composite::CompositePipeline;
use crate::pass::{RenderPassBuilder, clear_color};
use crate::shader::ShaderError;
use crate::sprites::{glow_sprites, lit_segments};

use glow::GlowPass;
use lines::LinePass;
use stars::StarPass;

#[derive(Debug, Error)]
pub enum GpuBackendError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("device exposes {available} storage buffers per vertex stage, need {needed}")]
    StorageBuffersUnavailable { needed: u32, available: u32 },

    #[error("pipeline creation failed for {format:?}: {message}")]
    Pipeline {
        format: wgpu::TextureFormat,
        message: String,
    },
}

/// Per-frame uniform shared by all sky pipelines.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkyUniform {
    /// ra, dec, scale, time in seconds.
    pub view: [f32; 4],
    /// width, height, horizon epsilon, twinkle floor.
    pub viewport: [f32; 4],
}

assert_eq_size!(SkyUniform, [u8; 32]);

impl SkyUniform {
    pub fn from_scene(scene: &SkyScene) -> Self {
        let view = scene.orientation();
        Self {
            view: [view.ra, view.dec, scene.scale(), scene.time_seconds()],
            viewport: [
                scene.width() as f32,
                scene.height() as f32,
                scene.settings().projection.horizon_epsilon,
                sky_core::star::TWINKLE_FLOOR,
            ],
        }
    }
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent::OVER,
};

pub(crate) struct PipelineSpec<'a> {
    pub label: &'static str,
    pub shader: &'a wgpu::ShaderModule,
    pub vertex_entry: &'static str,
    pub fragment_entry: &'static str,
    pub layout: &'a wgpu::BindGroupLayout,
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub format: wgpu::TextureFormat,
    pub blend: wgpu::BlendState,
}

pub(crate) fn create_pipeline(device: &wgpu::Device, spec: PipelineSpec<'_>) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(spec.label),
        bind_group_layouts: &[spec.layout],
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some(spec.vertex_entry),
            buffers: spec.buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some(spec.fragment_entry),
            targets: &[Some(wgpu::ColorTargetState {
                format: spec.format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// Key of the last background layer drawn: scene epoch and cache generation.
type LayerKey = (u64, u64);

/// Device objects built together under one error scope.
struct Passes {
    uniform_buffer: wgpu::Buffer,
    stars: StarPass,
    lines: LinePass,
    glow: GlowPass,
    composite: CompositePipeline,
}

impl Passes {
    fn build(device: &wgpu::Device, format: wgpu::TextureFormat) -> Result<Self, GpuBackendError> {
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sky-uniform"),
            size: std::mem::size_of::<SkyUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let stars = StarPass::new(device, format)?;
        let lines = LinePass::new(device, format, &uniform_buffer)?;
        let glow = GlowPass::new(device, format)?;
        let composite = CompositePipeline::new(device, format)?;
        Ok(Self {
            uniform_buffer,
            stars,
            lines,
            glow,
            composite,
        })
    }
}

pub struct GpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    format: wgpu::TextureFormat,
    line_width: f32,
    uniform_buffer: wgpu::Buffer,
    stars: StarPass,
    lines: LinePass,
    glow: GlowPass,
    composite: CompositePipeline,
    uploaded_epoch: Option<u64>,
    drawn_layer: Option<LayerKey>,
}

impl GpuBackend {
    /// Build every pipeline for `format`. Fails without touching the device
    /// queue when a shader does not validate, storage buffers are missing, or
    /// the device rejects a pipeline (for example a non-renderable format).
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        line_width: f32,
    ) -> Result<Self, GpuBackendError> {
        let available = device.limits().max_storage_buffers_per_shader_stage;
        if available < 1 {
            return Err(GpuBackendError::StorageBuffersUnavailable {
                needed: 1,
                available,
            });
        }

        // Validation errors inside the scope are returned here instead of
        // reaching the device's uncaptured-error handler.
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let built = Passes::build(device, format);
        if let Some(error) = pollster::block_on(scope.pop()) {
            return Err(GpuBackendError::Pipeline {
                format,
                message: error.to_string(),
            });
        }
        let Passes {
            uniform_buffer,
            stars,
            lines,
            glow,
            composite,
        } = built?;

        log::info!("GPU sky backend ready ({format:?})");

        Ok(Self {
            device: device.clone(),
            queue: queue.clone(),
            format,
            line_width,
            uniform_buffer,
            stars,
            lines,
            glow,
            composite,
            uploaded_epoch: None,
            drawn_layer: None,
        })
    }

    /// Host projection this backend needs from [`SkyScene::update`].
    pub fn host_projection(&self) -> HostProjection {
        HostProjection::LinkedOnly
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.format
    }

    /// Instances in the star storage buffer.
    pub fn star_instances(&self) -> u32 {
        self.stars.count()
    }

    /// Vertices in the current line buffer.
    pub fn line_vertices(&self) -> u32 {
        self.lines.count()
    }

    /// Drop the offscreen layer; the next frame rebuilds it at the new size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.glow.layer_size() != Some((width, height)) {
            self.glow.drop_layer();
            self.drawn_layer = None;
        }
    }

    /// Draw `scene` into `target`. Returns false when the frame was skipped.
    pub fn render(&mut self, scene: &SkyScene, target: &wgpu::TextureView) -> bool {
        let (width, height) = (scene.width(), scene.height());
        if width == 0 || height == 0 {
            return false;
        }

        let uniform = SkyUniform::from_scene(scene);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));

        if self.uploaded_epoch != Some(scene.epoch()) {
            self.stars
                .upload(&self.device, &self.uniform_buffer, scene.stars());
            self.uploaded_epoch = Some(scene.epoch());
            log::debug!("Uploaded {} star instances", self.stars.count());
        }

        let glow_color = scene.palette().glow;
        let vertices: Vec<LineVertex> = lit_segments(scene)
            .flat_map(|s| line_quad(s.from, s.to, self.line_width, glow_color, s.opacity))
            .collect();
        self.lines.upload(&self.device, &self.queue, &vertices);

        let layer_rebuilt = self.glow.ensure_layer(&self.device, &self.composite, width, height);
        let key = (scene.epoch(), scene.background().generation());
        let redraw_layer = layer_rebuilt || self.drawn_layer != Some(key);
        if redraw_layer {
            let instances: Vec<GlowInstance> =
                glow_sprites(scene).iter().map(GlowInstance::from).collect();
            self.glow
                .upload(&self.device, &self.uniform_buffer, &instances);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sky-encoder"),
            });

        let background = clear_color(scene.palette().background);
        if redraw_layer && let Some(layer_view) = self.glow.layer_view() {
            let mut pass = RenderPassBuilder::new()
                .clear_color(background)
                .label("sky-background-pass")
                .begin(&mut encoder, layer_view);
            self.glow.draw(&mut pass);
        }

        {
            let mut pass = RenderPassBuilder::new()
                .clear_color(background)
                .label("sky-main-pass")
                .begin(&mut encoder, target);
            if let Some(bind_group) = self.glow.composite_bind_group() {
                self.composite.draw(&mut pass, bind_group);
            }
            self.stars.draw(&mut pass);
            self.lines.draw(&mut pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        if redraw_layer {
            self.drawn_layer = Some(key);
        }
        true
    }

    /// Release GPU buffers and the offscreen layer. Pipelines stay valid.
    pub fn release(&mut self) {
        self.stars.release();
        self.lines.release();
        self.glow.release();
        self.uploaded_epoch = None;
        self.drawn_layer = None;
        log::debug!("GPU sky resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use sky_core::{SkySettings, ThemePalette, ViewParams};

    fn create_test_device() -> Option<(wgpu::Device, wgpu::Queue)> {
        crate::gpu::request_headless_device().ok()
    }

    fn offscreen(device: &wgpu::Device, w: u32, h: u32) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("test-target"),
                size: wgpu::Extent3d {
                    width: w,
                    height: h,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[test]
    fn test_uniform_carries_view_and_viewport() {
        let mut scene =
            SkyScene::new(SkySettings::default(), ThemePalette::default(), 800, 600).unwrap();
        scene.update(500.0, HostProjection::LinkedOnly);
        let u = SkyUniform::from_scene(&scene);
        assert_eq!(u.view[0], scene.orientation().ra);
        assert_eq!(u.view[1], scene.orientation().dec);
        assert_eq!(u.view[2], scene.scale());
        assert!((u.view[3] - 0.5).abs() < 1e-6, "time {}", u.view[3]);
        assert_eq!(&u.viewport[..2], &[800.0, 600.0]);
    }

    #[test]
    fn test_non_renderable_format_is_an_error() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let result = GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba32Float, 1.2);
        assert!(matches!(
            result,
            Err(GpuBackendError::Pipeline {
                format: wgpu::TextureFormat::Rgba32Float,
                ..
            })
        ));

        // The device stays usable for a supported format afterwards.
        assert!(GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, 1.2).is_ok());
    }

    #[test]
    fn test_render_uploads_once_per_epoch() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut backend =
            GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, 1.2).unwrap();
        let mut scene =
            SkyScene::new(SkySettings::default(), ThemePalette::default(), 320, 240).unwrap();
        let target = offscreen(&device, 320, 240);

        scene.update(16.0, backend.host_projection());
        assert!(backend.render(&scene, &target));
        assert_eq!(backend.star_instances() as usize, scene.stars().len());
        let epoch = backend.uploaded_epoch;

        scene.update(16.0, backend.host_projection());
        assert!(backend.render(&scene, &target));
        assert_eq!(backend.uploaded_epoch, epoch, "no rebuild, no re-upload");
        assert_eq!(backend.line_vertices(), 0, "no pointer, no lines");
    }

    #[test]
    fn test_lit_line_produces_vertices() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut backend =
            GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, 1.2).unwrap();
        let mut scene =
            SkyScene::new(SkySettings::default(), ThemePalette::default(), 800, 600).unwrap();
        scene.update(0.0, backend.host_projection());
        let edge = scene
            .connections()
            .iter()
            .find(|e| scene.stars()[e.a()].visible && scene.stars()[e.b()].visible)
            .copied();
        let Some(edge) = edge else {
            return;
        };
        scene.set_pointer_position(Some(scene.stars()[edge.a()].screen));
        scene.update(0.0, backend.host_projection());

        let target = offscreen(&device, 800, 600);
        assert!(backend.render(&scene, &target));
        assert!(backend.line_vertices() >= 6);
        assert_eq!(backend.line_vertices() % 6, 0);
    }

    #[test]
    fn test_release_then_render_reuploads() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut backend =
            GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba8UnormSrgb, 1.2).unwrap();
        let mut scene =
            SkyScene::new(SkySettings::default(), ThemePalette::default(), 64, 64).unwrap();
        scene.update(16.0, backend.host_projection());
        let target = offscreen(&device, 64, 64);
        assert!(backend.render(&scene, &target));

        backend.release();
        assert_eq!(backend.star_instances(), 0);
        assert!(backend.render(&scene, &target));
        assert_eq!(backend.star_instances() as usize, scene.stars().len());
    }

    /// Stars only, centered on Vega, frozen in time.
    fn stars_only_scene(width: u32, height: u32) -> SkyScene {
        let vega = sky_core::catalog::find("Vega").unwrap();
        let mut settings = SkySettings {
            view: ViewParams {
                base_declination: vega.dec,
                initial_right_ascension: vega.ra,
                drift_rate: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        settings.catalog.filler_min = 0;
        settings.catalog.filler_max = 0;
        settings.catalog.nebula_count = 0;
        settings.catalog.galaxy_count = 0;
        SkyScene::new(settings, ThemePalette::default(), width, height).unwrap()
    }

    /// Render into an `Rgba8Unorm` texture and read it back as tight RGBA rows.
    fn render_and_read(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        backend: &mut GpuBackend,
        scene: &SkyScene,
    ) -> Vec<u8> {
        let (w, h) = (scene.width(), scene.height());
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("test-readback-target"),
            size: wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        assert!(backend.render(scene, &view));

        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded = (w * 4).div_ceil(align) * align;
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("test-readback"),
            size: (padded * h) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("test-readback-encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(h),
                },
            },
            wgpu::Extent3d {
                width: w,
                height: h,
                depth_or_array_layers: 1,
            },
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = device.poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: None,
        });
        rx.recv().unwrap().unwrap();

        let mapped = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((w * h * 4) as usize);
        for row in 0..h {
            let start = (row * padded) as usize;
            pixels.extend_from_slice(&mapped[start..start + (w * 4) as usize]);
        }
        pixels
    }

    #[test]
    fn test_device_projection_matches_host_positions() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let (w, h) = (1280, 960);
        let mut backend =
            GpuBackend::new(&device, &queue, wgpu::TextureFormat::Rgba8Unorm, 1.2).unwrap();
        let mut scene = stars_only_scene(w, h);
        // Host-project every star so positions can be compared.
        scene.update(0.0, HostProjection::All);
        let pixels = render_and_read(&device, &queue, &mut backend, &scene);

        let luminance = |x: i32, y: i32| -> f32 {
            let i = ((y as u32 * w + x as u32) * 4) as usize;
            pixels[i..i + 3].iter().map(|&c| c as f32).sum()
        };
        let background = luminance(0, 0).min(luminance(w as i32 - 1, h as i32 - 1));

        let vega_index = scene.star_index("Vega").unwrap();
        let center = Vec2::new(w as f32 / 2.0, h as f32 / 2.0);
        assert!((scene.stars()[vega_index].screen - center).length() < 0.05);

        let visible: Vec<(usize, Vec2, f32)> = scene
            .stars()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visible)
            .map(|(i, s)| (i, s.screen, s.size))
            .collect();

        let mut checked = Vec::new();
        for &(index, p, size) in visible.iter().filter(|(_, _, size)| *size >= 1.5) {
            let window = (2.5 * size).ceil() as i32 + 1;
            let reach = window as f32 * std::f32::consts::SQRT_2;
            let inside = p.x >= (window + 1) as f32
                && p.y >= (window + 1) as f32
                && p.x <= (w as i32 - window - 2) as f32
                && p.y <= (h as i32 - window - 2) as f32;
            let isolated = visible
                .iter()
                .filter(|(other, _, _)| *other != index)
                .all(|(_, q, q_size)| (*q - p).length() > reach + 2.5 * q_size + 1.0);
            if !inside || !isolated {
                continue;
            }

            let (cx, cy) = (p.x.floor() as i32, p.y.floor() as i32);
            let mut weight = 0.0;
            let mut sum = Vec2::ZERO;
            for y in cy - window..=cy + window {
                for x in cx - window..=cx + window {
                    let excess = (luminance(x, y) - background).max(0.0);
                    weight += excess;
                    sum += Vec2::new(x as f32 + 0.5, y as f32 + 0.5) * excess;
                }
            }
            assert!(weight > 0.0, "nothing drawn near host position {p:?}");
            let centroid = sum / weight;
            assert!(
                (centroid - p).length() < 0.75,
                "device drew star {index} at {centroid:?}, host projected {p:?}"
            );
            checked.push(index);
        }
        assert!(checked.contains(&vega_index), "center star not compared");
        assert!(checked.len() >= 2, "only {} isolated stars compared", checked.len());
    }
}
