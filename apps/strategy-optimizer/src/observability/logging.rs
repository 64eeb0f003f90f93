//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over the configured level.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Include the event target (module path).
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "strategy_optimizer=info".to_string(),
            format: LogFormat::Pretty,
            with_target: false,
        }
    }
}

/// Install the global tracing subscriber.
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.with_target)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    };

    if installed {
        tracing::debug!(format = ?config.format, "Tracing initialized");
    }
    installed
}
