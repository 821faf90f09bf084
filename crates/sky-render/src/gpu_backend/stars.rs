//! Instanced star sprites projected in the vertex stage.

use bytemuck::{Pod, Zeroable};
use sky_core::RuntimeStar;
use static_assertions::assert_eq_size;
use wgpu::util::DeviceExt;

use super::{ADDITIVE, PipelineSpec, create_pipeline, storage_entry, uniform_entry};
use crate::shader::{ShaderError, create_validated_module};
use crate::shaders::STAR_SHADER;

/// Storage-buffer record for one star. Layout matches `Star` in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuStar {
    /// ra, dec, radius in pixels, base opacity.
    pub coord: [f32; 4],
    /// rgb, twinkle speed.
    pub color: [f32; 4],
    /// twinkle phase, tier, unused, unused.
    pub extra: [f32; 4],
}

assert_eq_size!(GpuStar, [u8; 48]);

impl From<&RuntimeStar> for GpuStar {
    fn from(star: &RuntimeStar) -> Self {
        let [r, g, b] = star.color;
        Self {
            coord: [star.ra, star.dec, star.size, star.base_opacity],
            color: [r, g, b, star.twinkle_speed],
            extra: [star.twinkle_phase, star.tier() as u8 as f32, 0.0, 0.0],
        }
    }
}

pub(super) struct StarPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    buffer: Option<wgpu::Buffer>,
    bind_group: Option<wgpu::BindGroup>,
    count: u32,
}

impl StarPass {
    pub(super) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ShaderError> {
        let shader = create_validated_module(device, "sky-star-shader", STAR_SHADER)?;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-star-bgl"),
            entries: &[uniform_entry(0), storage_entry(1)],
        });
        let pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "sky-star-pipeline",
                shader: &shader,
                vertex_entry: "vs_star",
                fragment_entry: "fs_star",
                layout: &bind_group_layout,
                buffers: &[],
                format,
                blend: ADDITIVE,
            },
        );
        Ok(Self {
            pipeline,
            bind_group_layout,
            buffer: None,
            bind_group: None,
            count: 0,
        })
    }

    /// Replace the star buffer. An empty slice leaves nothing to draw.
    pub(super) fn upload(
        &mut self,
        device: &wgpu::Device,
        uniform: &wgpu::Buffer,
        stars: &[RuntimeStar],
    ) {
        self.release();
        if stars.is_empty() {
            return;
        }
        let records: Vec<GpuStar> = stars.iter().map(GpuStar::from).collect();
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-star-instances"),
            contents: bytemuck::cast_slice(&records),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-star-bg"),
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
        });
        self.count = records.len() as u32;
        self.buffer = Some(buffer);
        self.bind_group = Some(bind_group);
    }

    pub(super) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(bind_group) = &self.bind_group else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.draw(0..6, 0..self.count);
    }

    pub(super) fn count(&self) -> u32 {
        self.count
    }

    pub(super) fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.bind_group = None;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::{LayerTier, SkyScene, SkySettings, ThemePalette};

    #[test]
    fn test_gpu_star_packs_runtime_fields() {
        let scene =
            SkyScene::new(SkySettings::default(), ThemePalette::default(), 400, 300).unwrap();
        let index = scene.star_index("Betelgeuse").expect("catalog star");
        let star = &scene.stars()[index];
        let packed = GpuStar::from(star);
        assert_eq!(packed.coord, [star.ra, star.dec, star.size, star.base_opacity]);
        assert_eq!(packed.color[3], star.twinkle_speed);
        assert_eq!(packed.extra[0], star.twinkle_phase);
        assert_eq!(packed.extra[1], LayerTier::Named as u8 as f32);
    }

    #[test]
    fn test_gpu_star_is_pod_sized() {
        let records = [GpuStar::default(); 3];
        assert_eq!(bytemuck::cast_slice::<GpuStar, u8>(&records).len(), 144);
    }
}
