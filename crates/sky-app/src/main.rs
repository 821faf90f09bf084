//! `skyview`: an animated night-sky backdrop.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Press F5 in the window to re-read `config.ron`.
//! `skyview --headless --frames 60 --output frames` renders PNGs without a window.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sky_app::{headless, window};
use sky_config::{CliArgs, Config};
use tracing::{error, info};

const APP_DIR: &str = "skyview";

fn config_dir(args: &CliArgs) -> PathBuf {
    args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    })
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let config_dir = config_dir(&args);

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    sky_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!("Config directory: {}", config_dir.display());

    if args.headless {
        return match headless::render_frames(&config, args.frames, &args.output) {
            Ok(paths) => {
                info!("Wrote {} frame(s)", paths.len());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Headless rendering failed: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let source = window::ConfigSource {
        dir: config_dir,
        args,
    };
    match window::run(config, source) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
