use crate::config::MarketConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
/// Keep the returned guard alive while logging to a file, or buffered lines are lost.
pub fn init_logging(config: &MarketConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let stdout_layer = if config.use_json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(false).with_ansi(true).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, &config.log_file);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_target(true)
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    guard
}
