//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Define the logger collaborator the parser reports through
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Log level configurable via config and `RUST_LOG`

use tracing::{Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, LoggingConfig};
use crate::error::Location;

/// Receives leveled diagnostics from the parser.
pub trait ConfLogger: Send + Sync {
    fn log(&self, level: Level, location: Option<&Location>, message: &str);
}

/// Forwards diagnostics to `tracing` with `file` and `line` fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl ConfLogger for TracingLogger {
    fn log(&self, level: Level, location: Option<&Location>, message: &str) {
        let file = location.map(|l| l.file.as_ref()).unwrap_or("-");
        let line = location.map(|l| l.line).unwrap_or(0);
        match level {
            Level::ERROR => tracing::error!(file, line, "{}", message),
            Level::WARN => tracing::warn!(file, line, "{}", message),
            Level::INFO => tracing::info!(file, line, "{}", message),
            Level::DEBUG => tracing::debug!(file, line, "{}", message),
            _ => tracing::trace!(file, line, "{}", message),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
///
/// Events go to stderr in both formats; stdout is left to command output.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("directive_engine={}", config.level).into());

    if let Err(e) = subscriber(config, filter, std::io::stderr).try_init() {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Subscriber for `config.format`, writing every event to `writer`.
fn subscriber<W>(
    config: &LoggingConfig,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Json => Box::new(
            registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer)),
        ),
        LogFormat::Pretty => Box::new(registry.with(tracing_subscriber::fmt::layer().with_writer(writer))),
    }
}
