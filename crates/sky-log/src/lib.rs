//! Structured logging for the night-sky viewer.
//!
//! Installs a `tracing` subscriber with a console layer and, in debug builds,
//! a JSON file layer. Library crates log through the `log` facade; the
//! subscriber's default `tracing-log` bridge picks those records up.

use std::path::Path;

use sky_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config names one.
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,naga=warn";

/// Name of the JSON log written under `log_dir`.
pub const LOG_FILE_NAME: &str = "skyview.log";

/// Resolve the filter string: config `debug.log_level` if set, else [`DEFAULT_FILTER`].
///
/// GPU crates stay at `warn` unless the configured string mentions them.
pub fn filter_directives(config: Option<&Config>) -> String {
    let Some(level) = config
        .map(|c| c.debug.log_level.trim())
        .filter(|l| !l.is_empty())
    else {
        return DEFAULT_FILTER.to_string();
    };
    let mut directives = level.to_string();
    for noisy in ["wgpu", "naga"] {
        if !level.contains(noisy) {
            directives.push_str(&format!(",{noisy}=warn"));
        }
    }
    directives
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the file layer
/// * `config` - source of the `debug.log_level` filter; `RUST_LOG` wins over it
///
/// ```no_run
/// use sky_log::init_logging;
///
/// init_logging(Some(std::path::Path::new("./logs")), cfg!(debug_assertions), None);
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE_NAME))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// `EnvFilter` for [`DEFAULT_FILTER`].
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
