//! Structured logging setup.
//!
//! Console output in text or JSON, plus an optional rolling file appender.
//! Filter precedence: config level, then `RUST_LOG`, then "info".

use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::Layer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Registry;

use crate::config::{LogFormat, LoggingConfig};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

pub fn init_with_config(cfg: &LoggingConfig) {
    let env_filter = match &cfg.level {
        Some(level) => tracing_subscriber::EnvFilter::new(level.as_str()),
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    let mut layers: Vec<BoxedLayer> = vec![console_layer(cfg.format)];
    if cfg.enable_file_logging {
        match file_layer(cfg) {
            Some(layer) => layers.push(layer),
            None => eprintln!(
                "Failed to create log directory '{}', continuing with stdout logs",
                cfg.dir
            ),
        }
    }

    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init();
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    let base = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(std::io::stdout);
    match format {
        LogFormat::Json => base.json().with_ansi(false).boxed(),
        LogFormat::Text => base.with_ansi(true).boxed(),
    }
}

fn file_layer(cfg: &LoggingConfig) -> Option<BoxedLayer> {
    let rotation = match cfg.rotation.to_lowercase().as_str() {
        "hourly" => tracing_appender::rolling::Rotation::HOURLY,
        "never" => tracing_appender::rolling::Rotation::NEVER,
        _ => tracing_appender::rolling::Rotation::DAILY,
    };

    std::fs::create_dir_all(&cfg.dir).ok()?;

    let appender =
        tracing_appender::rolling::RollingFileAppender::new(rotation, &cfg.dir, &cfg.filename);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Keep the flush guard alive for the process lifetime
    let _leaked: &'static _ = Box::leak(Box::new(guard));

    let base = tracing_subscriber::fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_ansi(false)
        .with_writer(writer);
    Some(match cfg.format {
        LogFormat::Json => base.json().boxed(),
        LogFormat::Text => base.boxed(),
    })
}
