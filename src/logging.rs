//! Structured logging setup.
//!
//! Built on the tracing crate; `RUST_LOG` overrides the configured level
//! when set.

use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Logging configuration options
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum log level when `RUST_LOG` is not set
    pub level: Level,
    /// Enable colored output
    pub color: bool,
    /// Show target/module name
    pub show_target: bool,
    /// Enable JSON format for machine parsing
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            color: io::stdout().is_terminal(),
            show_target: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Read configuration from `FLEET_LOG_LEVEL` and `FLEET_LOG_JSON`.
    pub fn from_env() -> Self {
        let level = match std::env::var("FLEET_LOG_LEVEL").as_deref() {
            Ok("error") => Level::ERROR,
            Ok("warn") => Level::WARN,
            Ok("info") => Level::INFO,
            Ok("debug") => Level::DEBUG,
            Ok("trace") => Level::TRACE,
            _ => Level::INFO,
        };

        let json_format = std::env::var("FLEET_LOG_JSON").as_deref() == Ok("true");

        Self {
            level,
            json_format,
            ..Default::default()
        }
    }
}

/// Initialize the logging system
pub fn init_logging(config: LoggingConfig) -> io::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fleet_registry={}", config.level)));

    let registry = Registry::default().with(env_filter);

    if config.json_format {
        let json_layer = fmt::layer().json().with_writer(io::stdout);
        json_layer.with_subscriber(registry).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_target(config.show_target)
            .with_level(true)
            .with_ansi(config.color)
            .with_writer(io::stdout);
        fmt_layer.with_subscriber(registry).init();
    }

    Ok(())
}
