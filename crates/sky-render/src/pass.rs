//! Render pass setup shared by the GPU pipelines.

use sky_core::Rgb;

/// Clear color for a theme background.
pub fn clear_color(background: Rgb) -> wgpu::Color {
    wgpu::Color {
        r: background[0] as f64,
        g: background[1] as f64,
        b: background[2] as f64,
        a: 1.0,
    }
}

/// Builder for single-color-attachment render passes.
#[derive(Debug, Clone)]
pub struct RenderPassBuilder {
    clear: Option<wgpu::Color>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderPassBuilder {
    /// A pass that keeps the attachment's existing contents.
    pub fn new() -> Self {
        Self {
            clear: None,
            label: None,
        }
    }

    /// Clear the attachment to `color` first.
    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear = Some(color);
        self
    }

    pub fn label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    fn load_op(&self) -> wgpu::LoadOp<wgpu::Color> {
        match self.clear {
            Some(color) => wgpu::LoadOp::Clear(color),
            None => wgpu::LoadOp::Load,
        }
    }

    /// Begin the pass on `view`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        view: &'encoder wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color_attachment = wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: self.load_op(),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        };

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color_attachment)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pass_loads() {
        let builder = RenderPassBuilder::new();
        assert!(matches!(builder.load_op(), wgpu::LoadOp::Load));
    }

    #[test]
    fn test_clear_color_is_used() {
        let builder = RenderPassBuilder::new().clear_color(wgpu::Color::RED);
        match builder.load_op() {
            wgpu::LoadOp::Clear(c) => assert_eq!(c, wgpu::Color::RED),
            other => panic!("expected clear, got {other:?}"),
        }
    }

    #[test]
    fn test_label_is_stored() {
        let builder = RenderPassBuilder::new().label("sky-pass");
        assert_eq!(builder.label, Some("sky-pass"));
    }

    #[test]
    fn test_theme_background_to_clear_color() {
        let c = clear_color([0.25, 0.5, 1.0]);
        assert_eq!((c.r, c.g, c.b, c.a), (0.25, 0.5, 1.0, 1.0));
    }
}
