//! Lit constellation lines as host-built quads.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use sky_core::Rgb;
use static_assertions::assert_eq_size;

use super::{PipelineSpec, create_pipeline, uniform_entry};
use crate::shader::{ShaderError, create_validated_module};
use crate::shaders::LINE_SHADER;

/// Extra half-width in pixels for the antialiased edge.
const FEATHER_PX: f32 = 1.0;
const MIN_CAPACITY: u64 = 64;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub pixel: [f32; 2],
    /// -1 on one edge, +1 on the other.
    pub across: f32,
    pub color: [f32; 4],
}

assert_eq_size!(LineVertex, [u8; 28]);

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Two triangles covering the segment `from`-`to` at `width` pixels.
pub fn line_quad(from: Vec2, to: Vec2, width: f32, color: Rgb, opacity: f32) -> [LineVertex; 6] {
    let half = width.max(0.0) * 0.5 + FEATHER_PX;
    let normal = (to - from).normalize_or_zero().perp() * half;
    let [r, g, b] = color;
    let vertex = |p: Vec2, across: f32| LineVertex {
        pixel: p.to_array(),
        across,
        color: [r, g, b, opacity],
    };
    let a0 = vertex(from - normal, -1.0);
    let a1 = vertex(from + normal, 1.0);
    let b0 = vertex(to - normal, -1.0);
    let b1 = vertex(to + normal, 1.0);
    [a0, b0, a1, a1, b0, b1]
}

pub(super) struct LinePass {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    count: u32,
}

impl LinePass {
    pub(super) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        uniform: &wgpu::Buffer,
    ) -> Result<Self, ShaderError> {
        let shader = create_validated_module(device, "sky-line-shader", LINE_SHADER)?;
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-line-bgl"),
            entries: &[uniform_entry(0)],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-line-bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });
        let pipeline = create_pipeline(
            device,
            PipelineSpec {
                label: "sky-line-pipeline",
                shader: &shader,
                vertex_entry: "vs_line",
                fragment_entry: "fs_line",
                layout: &bind_group_layout,
                buffers: &[LineVertex::layout()],
                format,
                blend: wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING,
            },
        );
        Ok(Self {
            pipeline,
            bind_group,
            buffer: None,
            capacity: 0,
            count: 0,
        })
    }

    /// Write `vertices`, growing the buffer to the next power of two if needed.
    pub(super) fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[LineVertex],
    ) {
        self.count = vertices.len() as u32;
        if vertices.is_empty() {
            return;
        }
        let needed = vertices.len() as u64;
        if self.buffer.is_none() || needed > self.capacity {
            if let Some(old) = self.buffer.take() {
                old.destroy();
            }
            self.capacity = needed.next_power_of_two().max(MIN_CAPACITY);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("sky-line-vertices"),
                size: self.capacity * std::mem::size_of::<LineVertex>() as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
        }
        if let Some(buffer) = &self.buffer {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(vertices));
        }
    }

    pub(super) fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(buffer) = &self.buffer else {
            return;
        };
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, buffer.slice(..));
        pass.draw(0..self.count, 0..1);
    }

    pub(super) fn count(&self) -> u32 {
        self.count
    }

    pub(super) fn release(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            buffer.destroy();
        }
        self.capacity = 0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_quad_spans_width_plus_feather() {
        let quad = line_quad(Vec2::new(10.0, 50.0), Vec2::new(110.0, 50.0), 2.0, [1.0; 3], 0.5);
        let ys: Vec<f32> = quad.iter().map(|v| v.pixel[1]).collect();
        let min = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert!((max - min - 4.0).abs() < 1e-4, "span {}", max - min);
        assert!(quad.iter().all(|v| v.color[3] == 0.5));
    }

    #[test]
    fn test_across_marks_opposite_edges() {
        let quad = line_quad(Vec2::ZERO, Vec2::new(0.0, 10.0), 1.0, [1.0; 3], 1.0);
        for v in quad {
            assert!(v.across == 1.0 || v.across == -1.0);
        }
        assert_eq!(quad.iter().filter(|v| v.across > 0.0).count(), 3);
    }

    #[test]
    fn test_degenerate_segment_has_no_area() {
        let p = Vec2::new(5.0, 5.0);
        let quad = line_quad(p, p, 2.0, [1.0; 3], 1.0);
        assert!(quad.iter().all(|v| v.pixel == [5.0, 5.0]));
    }
}
