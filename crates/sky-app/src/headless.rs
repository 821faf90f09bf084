//! Offscreen rendering to PNG files on the software backend.

use std::f32::consts::TAU;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use sky_config::Config;
use sky_core::SceneError;
use sky_render::{Pixmap, RenderTarget, SkyEngine};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Simulated frame interval.
pub const FRAME_MS: f32 = 1000.0 / 60.0;
/// Simulated scroll per frame, in pixels.
const SCROLL_PER_FRAME: f32 = 6.0;
/// Frames for the simulated pointer to circle the viewport once.
const POINTER_PERIOD: f32 = 240.0;

#[derive(Debug, Error)]
pub enum HeadlessError {
    #[error("scene setup failed: {0}")]
    Scene(#[from] SceneError),

    #[error("cannot allocate a {width}x{height} frame")]
    Allocation { width: u32, height: u32 },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: png::EncodingError,
    },
}

/// Straight-alpha RGBA8 bytes for PNG output.
pub fn unpremultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect()
}

pub fn write_png(path: &Path, pixmap: &Pixmap) -> Result<(), HeadlessError> {
    let file = File::create(path).map_err(|source| HeadlessError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), pixmap.width(), pixmap.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let encode_err = |source| HeadlessError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = encoder.write_header().map_err(encode_err)?;
    writer
        .write_image_data(&unpremultiplied_rgba(pixmap))
        .map_err(encode_err)?;
    Ok(())
}

/// Pointer position for simulated frame `frame`: a slow ellipse around the center.
pub fn simulated_pointer(frame: u32, width: u32, height: u32) -> (f32, f32) {
    let t = frame as f32 / POINTER_PERIOD * TAU;
    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    (cx + t.cos() * cx * 0.6, cy + t.sin() * cy * 0.6)
}

/// Render `frames` frames into `output`, returning the written paths.
#[instrument(skip(config), fields(width = config.window.width, height = config.window.height))]
pub fn render_frames(
    config: &Config,
    frames: u32,
    output: &Path,
) -> Result<Vec<PathBuf>, HeadlessError> {
    let (width, height) = (config.window.width, config.window.height);
    std::fs::create_dir_all(output).map_err(|source| HeadlessError::Io {
        path: output.to_path_buf(),
        source,
    })?;

    let mut engine = SkyEngine::new(
        config.sky_settings(),
        config.theme.palette(),
        config.render.line_width,
    );
    engine.init(width, height)?;
    let mut pixmap = Pixmap::new(width, height).ok_or(HeadlessError::Allocation { width, height })?;

    let mut written = Vec::with_capacity(frames as usize);
    for frame in 0..frames {
        engine.set_scroll_offset(frame as f32 * SCROLL_PER_FRAME);
        engine.set_pointer_position(Some(simulated_pointer(frame, width, height)));
        engine.update(FRAME_MS);
        if !engine.render(RenderTarget::Pixmap(&mut pixmap)) {
            debug!("Frame {frame} skipped");
            continue;
        }
        let path = output.join(format!("frame_{frame:04}.png"));
        write_png(&path, &pixmap)?;
        written.push(path);
    }

    if let Some(scene) = engine.scene() {
        info!(stats = ?scene.stats(), "Rendered {} frames to {}", written.len(), output.display());
    }
    engine.destroy();
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> Config {
        let mut config = Config::default();
        config.window.width = 96;
        config.window.height = 64;
        config
    }

    #[test]
    fn test_renders_requested_frames() {
        let dir = tempfile::tempdir().unwrap();
        let paths = render_frames(&small_config(), 3, dir.path()).unwrap();
        assert_eq!(paths.len(), 3);
        for path in &paths {
            let bytes = std::fs::read(path).unwrap();
            assert_eq!(&bytes[1..4], b"PNG", "{} is not a PNG", path.display());
        }
        assert!(paths[0].ends_with("frame_0000.png"));
    }

    #[test]
    fn test_zero_sized_window_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.window.width = 0;
        assert!(matches!(
            render_frames(&config, 1, dir.path()),
            Err(HeadlessError::Scene(_))
        ));
    }

    #[test]
    fn test_opaque_pixels_survive_unpremultiply() {
        let mut pixmap = Pixmap::new(2, 1).unwrap();
        pixmap.fill(tiny_skia::Color::from_rgba8(10, 20, 30, 255));
        assert_eq!(unpremultiplied_rgba(&pixmap), vec![10, 20, 30, 255, 10, 20, 30, 255]);
    }

    #[test]
    fn test_simulated_pointer_stays_inside() {
        for frame in (0..480).step_by(7) {
            let (x, y) = simulated_pointer(frame, 200, 100);
            assert!((0.0..=200.0).contains(&x) && (0.0..=100.0).contains(&y));
        }
    }
}
