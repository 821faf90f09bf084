//! Nebulae and galaxies rendered into a cached offscreen layer.

use bytemuck::{Pod, Zeroable};
use static_assertions::assert_eq_size;
use wgpu::util::DeviceExt;

use super::{ADDITIVE, PipelineSpec, create_pipeline, storage_entry, uniform_entry};
use crate::composite::CompositePipeline;
use crate::shader::{ShaderError, create_validated_module};
use crate::shaders::GLOW_SHADER;
use crate::sprites::GlowSprite;

/// Storage-buffer record for one glow sprite. Layout matches `Glow` in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GlowInstance {
    pub placement: [f32; 4],
    pub color: [f32; 4],
    pub shape: [f32; 4],
}

assert_eq_size!(GlowInstance, [u8; 48]);

impl From<&GlowSprite> for GlowInstance {
    fn from(sprite: &GlowSprite) -> Self {
        let [r, g, b] = sprite.color;
        let (kind, arms) = sprite.kind.shader_code();
        Self {
            placement: [sprite.center.x, sprite.center.y, sprite.radii.x, sprite.radii.y],
            color: [r, g, b, sprite.opacity],
            shape: [sprite.rotation, kind, arms, 0.0],
        }
    }
}

struct Layer {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    composite: wgpu::BindGroup,
    size: (u32, u32),
}

pub(super) struct GlowPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
    buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    count: u32,
    layer: Option<Layer>,
}

impl GlowPass {
    pub(super) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let shader = create_validated_module(device, "sky-glow-shader", GLOW_SHADER)?;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-glow-bgl"),
            entries: &[uniform_entry(0), storage_entry(1)],
        });
        let pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "sky-glow-pipeline",
                shader: &shader,
                vertex_entry: "vs_glow",
                fragment_entry: "fs_glow",
                layout: &bind_group_layout,
                buffers: &[],
                format,
                blend: ADDITIVE,
            },
        );
        Ok(Self {
            pipeline,
            bind_group_layout,
            format,
            buffer: None,
            bind_group: None,
            count: 0,
            layer: None,
        })
    }

    /// Make sure a layer of `width` x `height` exists. True if it was (re)created.
    pub(super) fn ensure_layer(
        &mut self,
        device: &wgpu::Device,
        composite: &CompositePipeline,
        width: u32,
        height: u32,
    ) -> bool {
        if self.layer_size() == Some((width, height)) {
            return false;
        }
        self.drop_layer();

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sky-background-layer"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = composite.bind(device, &view);
        self.layer = Some(Layer {
            texture,
            view,
            composite: bind_group,
            size: (width, height),
        });
        log::debug!("Background layer allocated at {width}x{height}");
        true
    }

    pub(super) fn layer_size(&self) -> Option<(u32, u32)> {
        self.layer.as_ref().map(|l| l.size)
    }

    pub(super) fn layer_view(&self) -> Option<&wgpu::TextureView> {
        self.layer.as_ref().map(|l| &l.view)
    }

    pub(super) fn composite_bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.layer.as_ref().map(|l| &l.composite)
    }

    pub(super) fn drop_layer(&mut self) {
        if let Some(layer) = self.layer.take() {
            layer.texture.destroy();
        }
    }

    pub(super) fn upload(
        &mut self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        instances: &[GlowInstance],
    ) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.bind_group = None;
        self.count = instances.len() as u32;
        if instances.is_empty() {
            return;
        }
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-glow-instances"),
            contents: bytemuck::cast_slice(instances),
            usage: wgpu::BufferUsages::STORAGE,
        });
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-glow-bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffer.as_entire_binding(),
                },
            ],
        }));
        self.buffer = Some(buffer);
    }

    pub(super) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..6, 0..self.count);
    }

    pub(super) fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.bind_group = None;
        self.count = 0;
        self.drop_layer();
    }
}
