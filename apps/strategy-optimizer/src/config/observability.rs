//! Observability configuration section.

use serde::{Deserialize, Serialize};

use crate::observability::{LoggingConfig, MetricsConfig};

/// Logging and metrics settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Prometheus exporter configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}
