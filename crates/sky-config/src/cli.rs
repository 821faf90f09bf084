//! Command-line arguments for `skyview`.

use std::path::PathBuf;

use clap::Parser;
use sky_core::ThemePreset;

use crate::{BackendPreference, Config};

/// `skyview` command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "skyview", about = "Animated night-sky backdrop")]
pub struct CliArgs {
    /// Window or image width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window or image height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Renderer to use.
    #[arg(long, value_enum)]
    pub backend: Option<BackendPreference>,

    /// Built-in palette (night, dusk, aurora).
    #[arg(long, value_parser = parse_theme)]
    pub theme: Option<ThemePreset>,

    /// Seed for the filler star field.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Render frames to PNG files instead of opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Frames to render in headless mode.
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// Output directory for headless frames.
    #[arg(long, default_value = "frames")]
    pub output: PathBuf,
}

fn parse_theme(s: &str) -> Result<ThemePreset, String> {
    match s.to_ascii_lowercase().as_str() {
        "night" => Ok(ThemePreset::Night),
        "dusk" => Ok(ThemePreset::Dusk),
        "aurora" => Ok(ThemePreset::Aurora),
        other => Err(format!("unknown theme '{other}' (expected night, dusk or aurora)")),
    }
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(backend) = args.backend {
            self.render.backend = backend;
        }
        if let Some(theme) = args.theme {
            self.theme.preset = theme;
            self.theme.custom = None;
        }
        if let Some(seed) = args.seed {
            self.sky.filler_seed = seed;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
