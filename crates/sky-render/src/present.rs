//! Shows CPU frames on a GPU surface.
//!
//! When the sky pipelines cannot be built but a device and swapchain exist,
//! the software frame is uploaded to a texture and blitted to the surface.

use tiny_skia::Pixmap;

use crate::composite::CompositePipeline;
use crate::pass::RenderPassBuilder;
use crate::shader::ShaderError;

struct Upload {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    size: (u32, u32),
}

pub struct PixmapPresenter {
    composite: CompositePipeline,
    upload: Option<Upload>,
}

impl PixmapPresenter {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Result<Self, ShaderError> {
        Ok(Self {
            composite: CompositePipeline::new(device, surface_format)?,
            upload: None,
        })
    }

    fn ensure_texture(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.upload.as_ref().is_some_and(|u| u.size == (width, height)) {
            return;
        }
        if let Some(old) = self.upload.take() {
            old.texture.destroy();
        }
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sky-cpu-frame"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.composite.bind(device, &view);
        self.upload = Some(Upload {
            texture,
            bind_group,
            size: (width, height),
        });
    }

    /// Upload `pixmap` and draw it over `target`.
    pub fn present(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixmap: &Pixmap,
        target: &wgpu::TextureView,
    ) {
        let (width, height) = (pixmap.width(), pixmap.height());
        self.ensure_texture(device, width, height);
        let Some(upload) = &self.upload else {
            return;
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &upload.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixmap.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sky-present-encoder"),
        });
        {
            let mut pass = RenderPassBuilder::new()
                .clear_color(wgpu::Color::BLACK)
                .label("sky-present-pass")
                .begin(&mut encoder, target);
            self.composite.draw(&mut pass, &upload.bind_group);
        }
        queue.submit(std::iter::once(encoder.finish()));
    }

    pub fn release(&mut self) {
        if let Some(upload) = self.upload.take() {
            upload.texture.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_reuses_texture_for_same_size() {
        let Ok((device, queue)) = crate::gpu::request_headless_device() else {
            return;
        };
        let format = wgpu::TextureFormat::Rgba8UnormSrgb;
        let mut presenter = PixmapPresenter::new(&device, format).unwrap();
        let target = device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("test-surface"),
                size: wgpu::Extent3d {
                    width: 16,
                    height: 8,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default());

        let pixmap = Pixmap::new(16, 8).unwrap();
        presenter.present(&device, &queue, &pixmap, &target);
        assert_eq!(presenter.upload.as_ref().map(|u| u.size), Some((16, 8)));
        presenter.present(&device, &queue, &pixmap, &target);
        assert_eq!(presenter.upload.as_ref().map(|u| u.size), Some((16, 8)));

        presenter.release();
        assert!(presenter.upload.is_none());
    }
}
