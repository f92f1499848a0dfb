//! Logging configuration and tracing initialisation

use crate::{Error, Result};
use serde::Deserialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit ANSI colours (disable when output is captured)
    #[serde(default = "default_ansi")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            ansi: default_ansi(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ansi() -> bool {
    true
}

impl LoggingConfig {
    /// Build the filter directive for the DFD crates
    ///
    /// A bare level ("debug") is scoped to the DFD crates; anything containing
    /// `=` or `,` is treated as a complete directive and used verbatim.
    pub fn directive(&self) -> String {
        let level = self.level.trim();
        if level.contains('=') || level.contains(',') {
            level.to_string()
        } else {
            format!("dfd_detect={level},dfd_common={level}")
        }
    }
}

/// Initialise the global tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. Writes to stderr so
/// that stdout stays clean for JSON output.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directive()))
        .map_err(|e| Error::Logging(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(config.ansi),
        )
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))
}
